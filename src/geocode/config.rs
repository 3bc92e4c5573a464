use anyhow::{Context, Result};
use footprints::crs::{CentroidCrs, Crs};
use footprints::geocoder::NominatimConfig;
use footprints::pacing::RateLimit;
use footprints::source::SourceFormat;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Validated run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub footprints: FootprintsConfig,
    pub mask: MaskConfig,
    pub geocoder: NominatimConfig,
    pub rate_limit: RateLimit,
    pub centroid_crs: CentroidCrs,
    pub output: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FootprintsConfig {
    pub source: PathBuf,
    #[serde(default)]
    pub format: SourceFormat,
    pub crs: Option<Crs>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MaskConfig {
    pub path: PathBuf,
    pub crs: Option<Crs>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    footprints: FootprintsConfig,
    mask: MaskConfig,
    #[serde(default)]
    geocoder: GeocoderSection,
    #[serde(default)]
    centroid: CentroidSection,
    output: OutputSection,
}

#[derive(Debug, Deserialize, Default)]
struct GeocoderSection {
    #[serde(flatten)]
    client: NominatimConfig,
    // Kept untyped so a wrong type is reported as such
    rate_limit: Option<toml::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct CentroidSection {
    crs: Option<CentroidCrs>,
}

#[derive(Debug, Deserialize)]
struct OutputSection {
    path: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).context("Failed to parse config file")?;

        let rate_limit = match &raw.geocoder.rate_limit {
            Some(value) => RateLimit::from_toml(value).context("Invalid [geocoder] rate_limit")?,
            None => RateLimit::default(),
        };

        Ok(Self {
            footprints: raw.footprints,
            mask: raw.mask,
            geocoder: raw.geocoder.client,
            rate_limit,
            centroid_crs: raw.centroid.crs.unwrap_or(CentroidCrs::Auto),
            output: raw.output.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footprints::GeocodeError;

    const FULL: &str = r#"
        [footprints]
        source = "Illinois.geojsonl.gz"
        format = "lines"

        [mask]
        path = "springfield.geojson"
        crs = "EPSG:3857"

        [geocoder]
        endpoint = "http://localhost:8080"
        user_agent = "footprints-test"
        email = "ops@example.com"
        timeout_secs = 10
        rate_limit = 1

        [centroid]
        crs = "EPSG:32616"

        [output]
        path = "geocoded.geojson"
    "#;

    const MINIMAL: &str = r#"
        [footprints]
        source = "Illinois.geojson"

        [mask]
        path = "springfield.geojson"

        [output]
        path = "geocoded.csv"
    "#;

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(FULL).unwrap();
        assert_eq!(config.footprints.format, SourceFormat::Lines);
        assert_eq!(config.mask.crs.map(|c| c.epsg()), Some(3857));
        assert_eq!(config.geocoder.endpoint, "http://localhost:8080");
        assert_eq!(config.geocoder.email.as_deref(), Some("ops@example.com"));
        assert_eq!(config.geocoder.timeout_secs, 10);
        assert_eq!(config.rate_limit.secs(), 1);
        assert_eq!(
            config.centroid_crs,
            CentroidCrs::Fixed(Crs::from_epsg(32616).unwrap())
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.footprints.format, SourceFormat::Auto);
        assert_eq!(config.rate_limit, RateLimit::DEFAULT);
        assert_eq!(config.centroid_crs, CentroidCrs::Auto);
        assert_eq!(
            config.geocoder.endpoint,
            "https://nominatim.openstreetmap.org"
        );
    }

    #[test]
    fn test_string_rate_limit_rejected() {
        let content = MINIMAL.replace(
            "[output]",
            "[geocoder]\nrate_limit = \"4\"\n\n[output]",
        );
        let err = Config::from_toml_str(&content).unwrap_err();

        let cause = err.downcast_ref::<GeocodeError>().unwrap();
        assert!(matches!(cause, GeocodeError::RateLimitType { found: "string" }));
    }

    #[test]
    fn test_unknown_crs_rejected() {
        let content = MINIMAL.replace(
            "[output]",
            "[centroid]\ncrs = \"EPSG:not-a-code\"\n\n[output]",
        );
        assert!(Config::from_toml_str(&content).is_err());
    }
}
