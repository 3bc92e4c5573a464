//! Area-of-interest mask used to filter footprints.

use std::path::Path;

use geo::{Centroid, Geometry, GeometryCollection, Point};
use tracing::info;

use crate::crs::{Crs, Transformer};
use crate::error::{GeocodeError, Result};
use crate::source::{read_collection, SourceFormat};

/// Mask geometry, always held in WGS84
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    geometry: Geometry<f64>,
}

impl Mask {
    /// Build a mask from a geometry expressed in `crs`.
    ///
    /// Geometries outside WGS84 are reprojected and the reprojected geometry
    /// is what gets stored.
    pub fn new(geometry: Geometry<f64>, crs: Crs) -> Result<Self> {
        if crs.is_canonical() {
            return Ok(Self { geometry });
        }

        info!("Reprojecting mask from {} to {}", crs, Crs::WGS84);
        let transformer = Transformer::new(crs, Crs::WGS84)?;
        Ok(Self {
            geometry: transformer.transform_geometry(&geometry)?,
        })
    }

    /// Load a mask from a GeoJSON file. Several features are combined into
    /// one geometry collection.
    pub fn from_geojson_file(path: &Path, crs_override: Option<Crs>) -> Result<Self> {
        let collection = read_collection(path, SourceFormat::Auto, crs_override)?;
        let crs = collection.crs;

        let mut geometries: Vec<Geometry<f64>> =
            collection.into_iter().map(|f| f.geometry).collect();

        let geometry = match geometries.len() {
            0 => return Err(GeocodeError::EmptyMask(path.to_path_buf())),
            1 => geometries.remove(0),
            _ => Geometry::GeometryCollection(GeometryCollection(geometries)),
        };

        Self::new(geometry, crs)
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn crs(&self) -> Crs {
        Crs::WGS84
    }

    /// The mask geometry expressed in `target`, for filtering data stored there
    pub fn to_crs(&self, target: Crs) -> Result<Geometry<f64>> {
        Transformer::new(Crs::WGS84, target)?.transform_geometry(&self.geometry)
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, CoordsIter};

    #[test]
    fn test_canonical_mask_stored_as_is() {
        let geometry: Geometry<f64> = polygon![
            (x: -90.0, y: 39.0),
            (x: -89.0, y: 39.0),
            (x: -89.0, y: 40.0),
            (x: -90.0, y: 40.0),
        ]
        .into();

        let mask = Mask::new(geometry.clone(), Crs::WGS84).unwrap();
        assert_eq!(mask.geometry(), &geometry);
        assert_eq!(mask.crs(), Crs::WGS84);
    }

    #[test]
    fn test_projected_mask_is_stored_reprojected() {
        let web_mercator = Crs::from_epsg(3857).unwrap();
        // Roughly lon -1..1, lat -1..1 in metres
        let geometry: Geometry<f64> = polygon![
            (x: -111_319.49, y: -111_325.14),
            (x: 111_319.49, y: -111_325.14),
            (x: 111_319.49, y: 111_325.14),
            (x: -111_319.49, y: 111_325.14),
        ]
        .into();

        let expected = Transformer::new(web_mercator, Crs::WGS84)
            .unwrap()
            .transform_geometry(&geometry)
            .unwrap();

        let mask = Mask::new(geometry, web_mercator).unwrap();
        assert_eq!(mask.geometry(), &expected);

        for c in mask.geometry().coords_iter() {
            assert!((c.x.abs() - 1.0).abs() < 1e-3, "x = {}", c.x);
            assert!((c.y.abs() - 1.0).abs() < 1e-3, "y = {}", c.y);
        }
    }
}
