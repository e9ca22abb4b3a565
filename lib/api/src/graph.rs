//! Location graph GraphQL client
//!
//! Users and their visited locations live behind a GraphQL endpoint. The
//! service answers failed mutations with the literal string `"Failure!"` in
//! place of a result, which is surfaced here as an error.

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tourfusion_core::LocationFeatures;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api";

/// Sentinel the service returns for a failed operation
pub const FAILURE_SENTINEL: &str = "Failure!";

const LOCATIONS_QUERY: &str = r#"
query Locations($user_id: String!) {
  locations(user_id: $user_id) {
    _id
    location { latitude longitude }
    elevation
    avg_temp
    trewartha
    climate_zone
  }
}
"#;

const ADD_LOCATION_MUTATION: &str = r#"
mutation AddLocation($user_id: String!, $name: NameInput!, $latitude: Float!, $longitude: Float!) {
  addLocation(user_id: $user_id, name: $name, latitude: $latitude, longitude: $longitude)
}
"#;

const DELETE_LOCATION_MUTATION: &str = r#"
mutation DeleteLocation($_id: String!) {
  deleteLocation(_id: $_id)
}
"#;

const ADD_USER_MUTATION: &str = r#"
mutation AddUser($email: String!, $username: String!, $password: String!) {
  addUser(email: $email, username: $username, password: $password)
}
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Extra attempts after a transport failure or 5xx response
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

/// A stored location as returned by the `locations` query
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub location: Point,
    pub elevation: f64,
    pub avg_temp: f64,
    pub trewartha: String,
    pub climate_zone: String,
}

impl LocationRecord {
    pub fn features(&self) -> LocationFeatures {
        LocationFeatures {
            latitude: self.location.latitude,
            longitude: self.location.longitude,
            elevation: self.elevation,
            average_temperature: self.avg_temp,
            trewartha: self.trewartha.clone(),
            climate_zone: self.climate_zone.clone(),
        }
    }
}

/// Postal name attached to a new location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationName {
    pub display: String,
    pub street: String,
    pub city: String,
    pub country: String,
    pub address: String,
    pub postal: String,
}

impl LocationName {
    /// Filler name for generated location number `idx`
    pub fn placeholder(idx: usize) -> Self {
        Self::for_city(idx, &format!("city_{idx}"), &format!("country_{idx}"))
    }

    /// Filler name with a real city and country
    pub fn for_city(idx: usize, city: &str, country: &str) -> Self {
        Self {
            display: format!("location_{idx}"),
            street: format!("street_{idx}"),
            city: city.to_string(),
            country: country.to_string(),
            address: format!("address_{idx}"),
            postal: format!("postal_{idx}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    config: GraphConfig,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// All locations of a user, oldest first
    pub async fn locations(&self, user_id: &str) -> Result<Vec<LocationRecord>> {
        let data = self.execute(LOCATIONS_QUERY, json!({ "user_id": user_id })).await?;
        field(&data, "locations")
    }

    /// A user's history as model features, oldest first
    pub async fn history(&self, user_id: &str) -> Result<Vec<LocationFeatures>> {
        let records = self.locations(user_id).await?;
        debug!(user_id, locations = records.len(), "fetched location history");
        Ok(records.iter().map(LocationRecord::features).collect())
    }

    /// Store a new location for `user_id`; the service fills in climate data
    pub async fn add_location(
        &self,
        user_id: &str,
        name: &LocationName,
        latitude: f64,
        longitude: f64,
    ) -> Result<Value> {
        let variables = json!({
            "user_id": user_id,
            "name": name,
            "latitude": latitude,
            "longitude": longitude,
        });
        let data = self.execute(ADD_LOCATION_MUTATION, variables).await?;
        Ok(data.get("addLocation").cloned().unwrap_or(Value::Null))
    }

    pub async fn delete_location(&self, id: &str) -> Result<()> {
        self.execute(DELETE_LOCATION_MUTATION, json!({ "_id": id })).await?;
        Ok(())
    }

    /// Create a user, returning its id
    pub async fn add_user(&self, email: &str, username: &str, password: &str) -> Result<String> {
        let variables = json!({ "email": email, "username": username, "password": password });
        let data = self.execute(ADD_USER_MUTATION, variables).await?;
        field(&data, "addUser")
    }

    /// Send one GraphQL operation, retrying transport failures
    async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        let body = json!({ "query": query, "variables": variables });
        let mut attempt = 0u32;

        loop {
            let outcome = self.http.post(&self.config.endpoint).json(&body).send().await;
            let retryable = match outcome {
                Ok(response) if response.status().is_server_error() => {
                    format!("server returned {}", response.status())
                }
                Ok(response) => {
                    let status = response.status();
                    let payload: Value = response
                        .json()
                        .await
                        .with_context(|| format!("invalid GraphQL response body (HTTP {status})"))?;
                    return check_response(payload);
                }
                Err(err) => err.to_string(),
            };

            if attempt >= self.config.max_retries {
                bail!(
                    "GraphQL request to {} failed after {} attempt(s): {}",
                    self.config.endpoint,
                    attempt + 1,
                    retryable
                );
            }
            let delay = backoff(attempt);
            warn!(attempt = attempt + 1, error = %retryable, ?delay, "GraphQL request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Delay before retry `attempt` (0-based): 200ms doubling, capped at 5s
pub fn backoff(attempt: u32) -> Duration {
    Duration::from_millis((200u64 << attempt.min(5)).min(5_000))
}

/// Extract `data` from a GraphQL response, rejecting errors and failure sentinels
pub fn check_response(payload: Value) -> Result<Value> {
    if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                .collect();
            bail!("GraphQL errors: {}", messages.join("; "));
        }
    }

    let data = match payload.get("data") {
        Some(Value::Object(data)) => data,
        _ => bail!("GraphQL response has no data"),
    };
    if let Some((name, _)) = data
        .iter()
        .find(|(_, value)| value.as_str() == Some(FAILURE_SENTINEL))
    {
        bail!("GraphQL operation {name} returned {FAILURE_SENTINEL:?}");
    }
    Ok(Value::Object(data.clone()))
}

fn field<T: DeserializeOwned>(data: &Value, name: &str) -> Result<T> {
    let value = data
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow!("GraphQL response is missing {name}"))?;
    serde_json::from_value(value).with_context(|| format!("unexpected shape for {name}"))
}
