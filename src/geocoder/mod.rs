//! Reverse geocoding clients.

mod nominatim;

pub use nominatim::{NominatimClient, NominatimConfig};

use std::future::Future;

use geo::Point;

use crate::error::Result;

/// A single reverse-geocode match
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Comma-delimited display address
    pub address: String,
    /// Position of the matched object, when the service reports one
    pub point: Option<Point<f64>>,
}

/// Service turning a coordinate into an address
pub trait ReverseGeocoder {
    /// Look up the single best match for a WGS84 point
    /// (x = longitude, y = latitude). `None` when nothing matches.
    fn reverse(&self, point: Point<f64>) -> impl Future<Output = Result<Option<Location>>> + Send;
}
