//! Building footprint rows and the collection that holds them.

use geo::Geometry;
use serde_json::{Map, Value};

use crate::crs::{Crs, Transformer};
use crate::error::Result;
use crate::parser::ParsedAddress;

/// Address recorded when the geocoder has no match for a centroid
pub const NO_ADDRESS_FOUND: &str = "No address found.";

/// One building footprint with its source attributes and derived columns
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub geometry: Geometry<f64>,

    /// Attributes carried over from the source feature
    pub properties: Map<String, Value>,

    /// Raw reverse-geocode result, or `NO_ADDRESS_FOUND`. None until geocoded.
    pub address: Option<String>,

    /// Structured address. None until parsed, and for `NO_ADDRESS_FOUND`.
    pub parsed_address: Option<ParsedAddress>,
}

impl Footprint {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry,
            properties: Map::new(),
            address: None,
            parsed_address: None,
        }
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}

/// Ordered table of footprints sharing one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintCollection {
    pub crs: Crs,
    pub footprints: Vec<Footprint>,
}

impl FootprintCollection {
    pub fn new(crs: Crs, footprints: Vec<Footprint>) -> Self {
        Self { crs, footprints }
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Footprint> {
        self.footprints.iter()
    }

    /// Reproject every geometry into `target`
    pub fn to_crs(mut self, target: Crs) -> Result<Self> {
        if self.crs == target {
            return Ok(self);
        }

        let transformer = Transformer::new(self.crs, target)?;
        for footprint in &mut self.footprints {
            footprint.geometry = transformer.transform_geometry(&footprint.geometry)?;
        }
        self.crs = target;
        Ok(self)
    }
}

impl IntoIterator for FootprintCollection {
    type Item = Footprint;
    type IntoIter = std::vec::IntoIter<Footprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.footprints.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Coord, CoordsIter};

    fn square() -> Geometry<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]
        .into()
    }

    #[test]
    fn test_to_same_crs_keeps_coordinates() {
        let collection = FootprintCollection::new(Crs::WGS84, vec![Footprint::new(square())]);
        let same = collection.clone().to_crs(Crs::WGS84).unwrap();
        assert_eq!(same, collection);
    }

    #[test]
    fn test_to_crs_updates_crs_and_geometry() {
        let web_mercator = Crs::from_epsg(3857).unwrap();
        let collection = FootprintCollection::new(Crs::WGS84, vec![Footprint::new(square())]);

        let projected = collection.to_crs(web_mercator).unwrap();
        assert_eq!(projected.crs, web_mercator);

        let coords: Vec<Coord<f64>> = projected.footprints[0].geometry.coords_iter().collect();
        // 1 degree of longitude at the equator is ~111km
        assert!(coords.iter().any(|c| c.x > 100_000.0));
    }
}
