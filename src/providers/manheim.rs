//! Manheim valuation client
//!
//! Fetches MMR valuations by VIN with a bearer token. The raw payload is
//! returned; shaping it is the job of [`crate::normalize::manheim`].

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::http::{join_url, read_json};
use crate::error::{AppError, Result};

const PROVIDER: &str = "Manheim";

/// Client for the Manheim valuations API
#[derive(Debug, Clone)]
pub struct ManheimClient {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ManheimClient {
    pub fn new(http: Client, base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_token,
        }
    }

    /// `GET /valuations/vin/{vin}?odometer=&zip=`
    pub async fn valuation(&self, vin: &str, miles: Option<u64>, zip: Option<&str>) -> Result<Value> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| AppError::Config("MANHEIM_ACCESS_TOKEN is not configured".to_string()))?;

        let url = join_url(&self.base_url, &["valuations", "vin", vin])?;
        let mut query = Vec::new();
        if let Some(miles) = miles {
            query.push(("odometer", miles.to_string()));
        }
        if let Some(zip) = zip {
            query.push(("zip", zip.to_string()));
        }

        debug!(path = url.path(), "calling Manheim");
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        read_json(PROVIDER, response).await
    }
}
