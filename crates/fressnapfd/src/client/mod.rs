//! Fressnapf pet-tracker cloud API client.
//!
//! One fetch per poll cycle: the device-state endpoint plus the last 30 days
//! of trips, flattened into a single [`DeviceRecord`]. Trip history is
//! supplementary to core device status, so a failing trips call degrades to
//! an empty list instead of failing the fetch.

mod record;
mod transform;

pub use record::{DeviceRecord, Trip, WeightEntry};

use chrono::{Duration, Local};
use serde_json::Value;
use tracing::{debug, warn};

/// Production API host. Overridable for tests and self-hosted proxies.
pub const DEFAULT_BASE_URL: &str = "https://itsmybike.cloud";

/// Errors fatal to one poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid auth token: {0}")]
    InvalidAuthToken(String),

    #[error("invalid device token: {0}")]
    InvalidDeviceToken(String),

    #[error("invalid serial number: {0}")]
    InvalidSerialNumber(String),

    #[error("unexpected API error: {0}")]
    UnknownApi(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response shape: missing {0}")]
    Schema(&'static str),
}

/// Client for one tracker's cloud API.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    serial_number: u64,
    device_token: String,
    auth_token: String,
}

impl Client {
    pub fn new(
        serial_number: u64,
        device_token: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, serial_number, device_token, auth_token)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        serial_number: u64,
        device_token: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            serial_number,
            device_token: device_token.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Fetch device state and trip history, flattened into one record.
    ///
    /// No retry at this layer; the caller's poll schedule is the retry.
    pub async fn fetch(&self) -> Result<DeviceRecord, FetchError> {
        let device = self.fetch_device().await?;

        let trips = match self.fetch_trips().await {
            Ok(trips) => trips,
            Err(e) => {
                warn!("trip history fetch failed, continuing without trips: {}", e);
                Vec::new()
            }
        };

        transform::flatten_device(self.serial_number, device, trips)
    }

    async fn fetch_device(&self) -> Result<Value, FetchError> {
        let url = format!(
            "{}/api/pet_tracker/v2/devices/{}?devicetoken={}",
            self.base_url, self.serial_number, self.device_token
        );
        let body = self.get(&url).await?;

        // The API reports auth and lookup failures as an `error` string in an
        // otherwise successful response.
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(classify_api_error(message));
        }

        Ok(body)
    }

    async fn fetch_trips(&self) -> Result<Vec<Value>, FetchError> {
        let from = (Local::now() - Duration::days(30)).format("%Y-%m-%d");
        let url = format!(
            "{}/api/pet_tracker/v2/devices/{}/trips_from/{}+0:0:0+-60?devicetoken={}",
            self.base_url, self.serial_number, from, self.device_token
        );
        let body = self.get(&url).await?;

        body.get("trips")
            .and_then(Value::as_array)
            .cloned()
            .ok_or(FetchError::Schema("trips"))
    }

    async fn get(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header("accept", "application/json")
            .header("authorization", format!("Token token={}", self.auth_token))
            .header("Connection", "keep-alive")
            .header("User-Agent", "okhttp/4.9.2")
            .header("Content-Type", "application/json")
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

/// Classify the API's `error` string by substring match.
fn classify_api_error(message: &str) -> FetchError {
    if message.contains("Access denied") {
        FetchError::InvalidAuthToken(message.to_string())
    } else if message.contains("Invalid devicetoken") {
        FetchError::InvalidDeviceToken(message.to_string())
    } else if message.contains("Device not found") {
        FetchError::InvalidSerialNumber(message.to_string())
    } else {
        FetchError::UnknownApi(message.to_string())
    }
}
