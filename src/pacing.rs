//! Pacing of outbound geocoding requests.

use std::future::Future;
use std::time::Duration;

use crate::error::{GeocodeError, Result};

/// Whole seconds to wait after each geocoding request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit(u64);

impl RateLimit {
    pub const DEFAULT: RateLimit = RateLimit(4);

    pub fn from_secs(secs: u64) -> Self {
        RateLimit(secs)
    }

    pub fn secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Validate a configuration value. Only integers are accepted.
    pub fn from_toml(value: &toml::Value) -> Result<Self> {
        match value {
            toml::Value::Integer(secs) => Self::try_from(*secs),
            other => Err(GeocodeError::RateLimitType {
                found: other.type_str(),
            }),
        }
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        RateLimit::DEFAULT
    }
}

impl TryFrom<i64> for RateLimit {
    type Error = GeocodeError;

    fn try_from(secs: i64) -> Result<Self> {
        u64::try_from(secs)
            .map(RateLimit)
            .map_err(|_| GeocodeError::NegativeRateLimit(secs))
    }
}

/// Waits between consecutive geocoding requests
pub trait Pacer {
    fn wait(&self) -> impl Future<Output = ()> + Send;
}

/// Sleeps a fixed interval on the tokio clock
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl From<RateLimit> for FixedInterval {
    fn from(limit: RateLimit) -> Self {
        Self::new(limit.as_duration())
    }
}

impl Pacer for FixedInterval {
    async fn wait(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Never waits. For tests and geocoders without a usage policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    async fn wait(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_integer() {
        let limit = RateLimit::from_toml(&toml::Value::Integer(2)).unwrap();
        assert_eq!(limit.secs(), 2);
        assert_eq!(RateLimit::default().secs(), 4);
    }

    #[test]
    fn test_from_toml_rejects_string() {
        let err = RateLimit::from_toml(&toml::Value::String("4".to_string())).unwrap_err();
        assert!(matches!(err, GeocodeError::RateLimitType { found: "string" }));
        assert_eq!(
            err.to_string(),
            "The rate_limit argument should be int, not string."
        );
    }

    #[test]
    fn test_from_toml_rejects_float() {
        assert!(matches!(
            RateLimit::from_toml(&toml::Value::Float(1.5)),
            Err(GeocodeError::RateLimitType { found: "float" })
        ));
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            RateLimit::try_from(-1),
            Err(GeocodeError::NegativeRateLimit(-1))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_interval_sleeps() {
        let pacer = FixedInterval::from(RateLimit::DEFAULT);
        let start = tokio::time::Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_returns_immediately() {
        let pacer = FixedInterval::from(RateLimit::from_secs(0));
        let start = tokio::time::Instant::now();
        pacer.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
