//! Blocking HTTP client for the zone API.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use utm_core::Verdict;

#[derive(Debug, Serialize)]
struct CheckPointBody {
    lat: f64,
    lng: f64,
    altitude: f64,
}

/// Client for the `/v1/zones` endpoints.
pub struct ZoneClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ZoneClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the UTM server (e.g., "http://localhost:3000")
    /// * `token` - JWT bearer token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Evaluate a point against the registered airspace.
    pub fn check_point(&self, lat: f64, lng: f64, altitude: f64) -> Result<Verdict> {
        let url = format!("{}/v1/zones/check", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&CheckPointBody { lat, lng, altitude })
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Server returned {}: {}", status, body);
        }

        response.json().context("Failed to parse verdict")
    }
}
