//! Nominatim `/reverse` client.

use std::time::Duration;

use geo::Point;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{Location, ReverseGeocoder};
use crate::error::{GeocodeError, Result};

const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_USER_AGENT: &str = "footprints/0.1 (building footprint geocoder)";

/// Building-level detail
const ZOOM: &str = "18";

#[derive(Debug, Clone, Deserialize)]
pub struct NominatimConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Contact address sent with every request, as the usage policy asks
    pub email: Option<String>,
    /// Preferred language for the returned address
    pub language: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            user_agent: default_user_agent(),
            email: None,
            language: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub struct NominatimClient {
    client: Client,
    reverse_url: Url,
    email: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

impl ReverseResponse {
    fn into_location(self) -> Option<Location> {
        if let Some(error) = self.error {
            debug!("Nominatim returned no match: {}", error);
            return None;
        }

        let address = self.display_name?;
        let point = match (self.lon, self.lat) {
            (Some(lon), Some(lat)) => match (lon.parse(), lat.parse()) {
                (Ok(x), Ok(y)) => Some(Point::new(x, y)),
                _ => None,
            },
            _ => None,
        };

        Some(Location { address, point })
    }
}

impl NominatimClient {
    pub fn new(config: &NominatimConfig) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with '/'
        let mut endpoint = config.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let reverse_url = Url::parse(&endpoint)?.join("reverse")?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            reverse_url,
            email: config.email.clone(),
            language: config.language.clone(),
        })
    }

    fn request_url(&self, point: Point<f64>) -> Url {
        let mut url = self.reverse_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("format", "jsonv2")
                .append_pair("lat", &point.y().to_string())
                .append_pair("lon", &point.x().to_string())
                .append_pair("zoom", ZOOM);
            if let Some(email) = &self.email {
                query.append_pair("email", email);
            }
            if let Some(language) = &self.language {
                query.append_pair("accept-language", language);
            }
        }
        url
    }
}

impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, point: Point<f64>) -> Result<Option<Location>> {
        let url = self.request_url(point);
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ReverseResponse = response.json().await?;
        Ok(body.into_location())
    }
}
