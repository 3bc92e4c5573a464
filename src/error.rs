//! Error type shared by the library modules.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("The rate_limit argument should be int, not {found}.")]
    RateLimitType { found: &'static str },

    #[error("rate_limit must be a non-negative number of seconds, got {0}")]
    NegativeRateLimit(i64),

    #[error("invalid CRS identifier '{0}'")]
    InvalidCrs(String),

    #[error("EPSG:{0} is not in the crs-definitions database")]
    UnsupportedCrs(u16),

    #[error("projection from {from} to {to} failed: {reason}")]
    Projection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON in {}: {reason}", path.display())]
    GeoJson { path: PathBuf, reason: String },

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("mask file {} contains no geometry", .0.display())]
    EmptyMask(PathBuf),

    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid geocoder endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("batch cancelled after {processed} of {total} footprints")]
    Cancelled { processed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
