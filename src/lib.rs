//! Footprints - reverse geocoding of building footprints
//!
//! This library loads building footprints inside a mask, reverse geocodes
//! their centroids at a fixed pace and parses the returned addresses. It
//! backs the `geocode` binary.

pub mod crs;
pub mod error;
pub mod geocoder;
pub mod models;
pub mod output;
pub mod pacing;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod source;

pub use error::{GeocodeError, Result};
pub use models::{Footprint, FootprintCollection, Mask};
pub use pipeline::{CancelFlag, FootprintGeocoder};
