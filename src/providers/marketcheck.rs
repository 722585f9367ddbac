//! MarketCheck API client
//!
//! Covers the VIN report endpoints (generate / access), price prediction,
//! market days supply, active listing search and listing detail. Every call
//! is authenticated with the `api_key` query parameter.

use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use super::http::{join_url, read_body, read_json};
use crate::error::{AppError, Result};

const PROVIDER: &str = "MarketCheck";

/// Client for the MarketCheck REST API
#[derive(Debug, Clone)]
pub struct MarketCheckClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl MarketCheckClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("MARKETCHECK_API_KEY is not configured".to_string()))
    }

    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Response> {
        let api_key = self.api_key()?;
        let url = join_url(&self.base_url, segments)?;
        debug!(path = url.path(), "calling MarketCheck");

        Ok(self
            .http
            .get(url)
            .query(&[("api_key", api_key)])
            .query(query)
            .send()
            .await?)
    }

    // == VIN Reports ==
    /// `GET /v2/vindata/generate-report/{vin}`
    ///
    /// The body is returned as-is: it may embed the report directly, carry a
    /// report id, or (for HTML reports) not be JSON at all.
    pub async fn generate_report(&self, vin: &str) -> Result<Value> {
        let response = self
            .get(&["v2", "vindata", "generate-report", vin], &[])
            .await?;
        read_body(PROVIDER, response).await
    }

    /// `GET /v2/vindata/access-report/{report_id}`
    pub async fn access_report(&self, report_id: &str) -> Result<Value> {
        let response = self
            .get(&["v2", "vindata", "access-report", report_id], &[])
            .await?;
        read_json(PROVIDER, response).await
    }

    /// `GET /v2/vindata/access-report/{vin}`, the alternate path used when
    /// report generation fails.
    pub async fn access_report_by_vin(&self, vin: &str) -> Result<Value> {
        let response = self
            .get(&["v2", "vindata", "access-report", vin], &[])
            .await?;
        read_json(PROVIDER, response).await
    }

    // == Market Data ==
    /// `GET /v2/predict/car/us/marketcheck_price`
    pub async fn predict_price(
        &self,
        vin: &str,
        miles: Option<u64>,
        zip: Option<&str>,
        dealer_type: Option<&str>,
    ) -> Result<Value> {
        let mut query = vec![("vin", vin.to_string())];
        if let Some(miles) = miles {
            query.push(("miles", miles.to_string()));
        }
        if let Some(zip) = zip {
            query.push(("zip", zip.to_string()));
        }
        query.push(("dealer_type", dealer_type.unwrap_or("franchise").to_string()));

        let response = self
            .get(&["v2", "predict", "car", "us", "marketcheck_price"], &query)
            .await?;
        read_json(PROVIDER, response).await
    }

    /// `GET /v2/mds/car?vin=` (market days supply, used as the demand score)
    pub async fn market_days_supply(&self, vin: &str) -> Result<Value> {
        let response = self
            .get(&["v2", "mds", "car"], &[("vin", vin.to_string())])
            .await?;
        read_json(PROVIDER, response).await
    }

    /// `GET /v2/search/car/active`
    pub async fn search_active(&self, query: &[(&str, String)]) -> Result<Value> {
        let response = self.get(&["v2", "search", "car", "active"], query).await?;
        read_json(PROVIDER, response).await
    }

    /// `GET /v2/listing/car/{id}`
    pub async fn listing(&self, listing_id: &str) -> Result<Value> {
        let response = self.get(&["v2", "listing", "car", listing_id], &[]).await?;
        read_json(PROVIDER, response).await
    }
}
