//! Coordinate reference systems.
//!
//! Every CRS is identified by its EPSG code and resolved through the
//! crs-definitions database, so only codes that database knows are accepted.

mod projection;

pub use projection::Transformer;

use std::fmt;
use std::str::FromStr;

use geo::Point;
use serde::Deserialize;

use crate::error::{GeocodeError, Result};

/// An EPSG-coded coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Crs(u16);

impl Crs {
    /// WGS84 longitude/latitude, the canonical system for stored geometries
    pub const WGS84: Crs = Crs(4326);

    /// Build from an EPSG code, rejecting codes without a known definition
    pub fn from_epsg(code: u16) -> Result<Self> {
        if crs_definitions::from_code(code).is_none() {
            return Err(GeocodeError::UnsupportedCrs(code));
        }
        Ok(Crs(code))
    }

    pub fn epsg(&self) -> u16 {
        self.0
    }

    pub fn is_canonical(&self) -> bool {
        *self == Crs::WGS84
    }

    /// PROJ4 definition string for this CRS
    pub fn proj_string(&self) -> Option<&'static str> {
        crs_definitions::from_code(self.0).map(|def| def.proj4)
    }

    /// Whether coordinates are longitude/latitude degrees rather than metres
    pub fn is_geographic(&self) -> bool {
        match self.proj_string() {
            Some(proj) => proj.contains("+proj=longlat"),
            None => self.0 == 4326,
        }
    }

    /// WGS84 / UTM zone containing a WGS84 point (EPSG 326xx north, 327xx south)
    pub fn utm_zone_for(point: Point<f64>) -> Self {
        let zone = ((point.x() + 180.0) / 6.0).floor().clamp(0.0, 59.0) as u16 + 1;
        let base = if point.y() >= 0.0 { 32600 } else { 32700 };
        Crs(base + zone)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Crs {
    type Err = GeocodeError;

    /// Accepts `4326`, `EPSG:4326`, OGC URNs such as
    /// `urn:ogc:def:crs:EPSG::3857`, and the `CRS84` alias for WGS84.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Crs::WGS84);
        }

        let code = if upper.starts_with("EPSG:") || upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            trimmed.rsplit(':').next().unwrap_or_default()
        } else {
            trimmed
        };

        let code: u16 = code
            .parse()
            .map_err(|_| GeocodeError::InvalidCrs(trimmed.to_string()))?;
        Crs::from_epsg(code)
    }
}

impl TryFrom<String> for Crs {
    type Error = GeocodeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Projected CRS used for centroid computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum CentroidCrs {
    /// UTM zone of the area of interest
    Auto,
    Fixed(Crs),
}

impl CentroidCrs {
    /// Resolve to a concrete CRS, using `anchor` (WGS84) for `Auto`
    pub fn resolve(&self, anchor: Point<f64>) -> Crs {
        match self {
            CentroidCrs::Auto => Crs::utm_zone_for(anchor),
            CentroidCrs::Fixed(crs) => *crs,
        }
    }
}

impl From<Crs> for CentroidCrs {
    fn from(crs: Crs) -> Self {
        CentroidCrs::Fixed(crs)
    }
}

impl FromStr for CentroidCrs {
    type Err = GeocodeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(CentroidCrs::Auto)
        } else {
            s.parse().map(CentroidCrs::Fixed)
        }
    }
}

impl TryFrom<String> for CentroidCrs {
    type Error = GeocodeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
