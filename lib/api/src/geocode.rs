//! Place name geocoding through Nominatim

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const USER_AGENT: &str = "tourfusion";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Attempts per lookup before giving up
    #[serde(default = "default_tries")]
    pub tries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    NOMINATIM_ENDPOINT.to_string()
}

fn default_tries() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            tries: default_tries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    config: GeocoderConfig,
}

impl Geocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    /// Coordinates of the best match for `query`, `None` if nothing matches
    pub async fn locate(&self, query: &str) -> Result<Option<Coordinates>> {
        let tries = self.config.tries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=tries {
            let request = self
                .http
                .get(&self.config.endpoint)
                .query(&[("q", query), ("format", "json"), ("limit", "1")]);

            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => {
                    let body = response.text().await.context("failed to read geocoder response")?;
                    let coordinates = parse_places(&body)?;
                    debug!(query, ?coordinates, "geocoded");
                    return Ok(coordinates);
                }
                Err(err) => {
                    warn!(query, attempt, error = %err, "geocoding attempt failed");
                    last_error = err.to_string();
                }
            }
        }
        bail!("geocoding {query:?} failed after {tries} tries: {last_error}")
    }
}

/// First place of a Nominatim JSON answer
pub fn parse_places(body: &str) -> Result<Option<Coordinates>> {
    let places: Vec<Place> = serde_json::from_str(body).context("unexpected geocoder response")?;
    let Some(place) = places.first() else {
        return Ok(None);
    };
    Ok(Some(Coordinates {
        latitude: place.lat.parse().with_context(|| format!("bad latitude {:?}", place.lat))?,
        longitude: place.lon.parse().with_context(|| format!("bad longitude {:?}", place.lon))?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_place() {
        let body = r#"[{"lat": "48.8588897", "lon": "2.3200410", "display_name": "Paris"}, {"lat": "0", "lon": "0"}]"#;
        let coordinates = parse_places(body).unwrap().unwrap();
        assert_eq!(coordinates.latitude, 48.8588897);
        assert_eq!(coordinates.longitude, 2.3200410);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse_places("[]").unwrap(), None);
    }

    #[test]
    fn test_malformed() {
        assert!(parse_places(r#"{"error": "rate limited"}"#).is_err());
        assert!(parse_places(r#"[{"lat": "north", "lon": "1"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_geocoder() {
        let geocoder = Geocoder::new(GeocoderConfig {
            endpoint: "http://127.0.0.1:9/search".to_string(),
            tries: 2,
            timeout_secs: 2,
        })
        .unwrap();
        let err = geocoder.locate("Paris, France").await.unwrap_err();
        assert!(err.to_string().contains("after 2 tries"));
    }
}
