//! Response DTOs for the gateway API
//!
//! Every body carries `success`; failures go through [`ErrorResponse`].

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Generic success body for the cached proxy routes.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
    /// Whether `data` came from the response cache
    pub cached: bool,
}

impl<T> DataResponse<T> {
    /// Data fetched from the provider on this request
    pub fn fresh(data: T) -> Self {
        Self {
            success: true,
            data,
            cached: false,
        }
    }

    /// Data served from the response cache
    pub fn cached(data: T) -> Self {
        Self {
            success: true,
            data,
            cached: true,
        }
    }
}

/// Response body for `POST /api/vindata/generate-report`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportResponse {
    pub success: bool,
    /// Provider endpoint that produced the result
    pub endpoint: String,
    pub has_direct_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response body for the full VIN-report flow (`/api/vindata/report`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VinReportResponse {
    pub success: bool,
    pub data: Value,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub cached: bool,
}

/// Response body for `GET /api/cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<&CacheStats> for CacheStatsResponse {
    fn from(stats: &CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for `DELETE /api/cache`
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearResponse {
    pub success: bool,
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub demo_mode: bool,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(demo_mode: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            demo_mode,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Provider status when the failure came from a provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
            status: None,
        }
    }

    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_response_serialize() {
        let resp = DataResponse::cached(json!({"price": 1}));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"success": true, "data": {"price": 1}, "cached": true}));
    }

    #[test]
    fn test_generate_report_response_is_camel_case() {
        let resp = GenerateReportResponse {
            success: true,
            endpoint: "generate-report".into(),
            has_direct_data: false,
            report_id: Some("abc".into()),
            data: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["hasDirectData"], json!(false));
        assert_eq!(json["reportId"], json!("abc"));
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            expirations: 5,
            total_entries: 100,
        };
        let resp = CacheStatsResponse::from(&stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.expirations, 5);
        assert_eq!(resp.total_entries, 100);

        let resp = CacheStatsResponse::from(&CacheStats::new());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(true);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
        assert!(json.contains("\"demo_mode\":true"));
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let json = serde_json::to_value(ErrorResponse::new("Something went wrong")).unwrap();
        assert_eq!(json, json!({"success": false, "error": "Something went wrong"}));
    }
}
