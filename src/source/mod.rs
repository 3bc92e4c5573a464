//! Footprint data sources.
//!
//! A reader hands back the features intersecting a mask, still in the
//! source's own CRS. Reprojection to WGS84 is the pipeline's job.

mod geojson_file;

pub use geojson_file::{read_collection, GeoJsonSource, SourceFormat};

use tracing::debug;

use crate::error::Result;
use crate::models::{FootprintCollection, Mask};

/// Spatial reader with mask filtering
pub trait FootprintReader {
    /// Footprints intersecting `mask`, in the reader's CRS
    fn read_masked(&self, mask: &Mask) -> Result<FootprintCollection>;
}

impl FootprintReader for FootprintCollection {
    fn read_masked(&self, mask: &Mask) -> Result<FootprintCollection> {
        filter_by_mask(self.clone(), mask)
    }
}

/// Keep only footprints intersecting the mask. The mask is reprojected into
/// the collection's CRS when the two differ.
pub fn filter_by_mask(
    mut collection: FootprintCollection,
    mask: &Mask,
) -> Result<FootprintCollection> {
    let geometry = mask.to_crs(collection.crs)?;
    let before = collection.len();

    collection
        .footprints
        .retain(|f| geo::Intersects::intersects(&geometry, &f.geometry));

    debug!("Mask kept {} of {} footprints", collection.len(), before);
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::{Crs, Transformer};
    use crate::models::Footprint;
    use geo::{polygon, Geometry};

    fn building(x: f64, y: f64) -> Footprint {
        Footprint::new(
            polygon![
                (x: x, y: y),
                (x: x + 0.0001, y: y),
                (x: x + 0.0001, y: y + 0.0001),
                (x: x, y: y + 0.0001),
            ]
            .into(),
        )
    }

    fn springfield_mask() -> Geometry<f64> {
        polygon![
            (x: -89.70, y: 39.75),
            (x: -89.60, y: 39.75),
            (x: -89.60, y: 39.82),
            (x: -89.70, y: 39.82),
        ]
        .into()
    }

    #[test]
    fn test_filter_in_memory_collection() {
        let collection = FootprintCollection::new(
            Crs::WGS84,
            vec![building(-89.65, 39.78), building(-88.0, 40.0), building(-89.61, 39.76)],
        );
        let mask = Mask::new(springfield_mask(), Crs::WGS84).unwrap();

        let kept = collection.read_masked(&mask).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.footprints[0], building(-89.65, 39.78));
    }

    #[test]
    fn test_filter_collection_in_other_crs() {
        let web_mercator = Crs::from_epsg(3857).unwrap();
        let collection = FootprintCollection::new(
            Crs::WGS84,
            vec![building(-89.65, 39.78), building(-88.0, 40.0)],
        )
        .to_crs(web_mercator)
        .unwrap();

        // Mask supplied in projected metres gets normalised, then pushed back
        // into the data's CRS for filtering
        let projected_mask = Transformer::new(Crs::WGS84, web_mercator)
            .unwrap()
            .transform_geometry(&springfield_mask())
            .unwrap();
        let mask = Mask::new(projected_mask, web_mercator).unwrap();

        let kept = collection.read_masked(&mask).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.crs, web_mercator);
    }
}
