//! API Handlers
//!
//! Route handlers follow one pipeline: validate input, consult the response
//! cache, call the provider on a miss, store and return. Demo mode is handled
//! before any of this by the demo route layer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{self, ResponseCache};
use crate::config::Config;
use crate::demo::DemoResponder;
use crate::error::{AppError, Result};
use crate::models::{
    AccessReportRequest, CacheClearQuery, CacheClearResponse, CacheStatsResponse, DataResponse,
    GenerateReportResponse, HealthResponse, SearchQuery, VehicleRequest, VinReportResponse,
    VinRequest,
};
use crate::normalize::normalize_manheim_response;
use crate::providers::{build_client, ManheimClient, MarketCheckClient};
use crate::vin_report::{GenerateOutcome, VinReportFlow, ACCESS_ENDPOINT};

// == Cache Lifetimes ==
/// VIN reports do not change once generated
pub const VIN_REPORT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Market pricing and valuations
pub const MARKET_TTL: Duration = Duration::from_secs(60 * 60);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide response cache
    pub cache: Arc<RwLock<ResponseCache>>,
    pub marketcheck: MarketCheckClient,
    pub manheim: ManheimClient,
    pub demo: Arc<DemoResponder>,
}

impl AppState {
    pub fn new(
        cache: ResponseCache,
        marketcheck: MarketCheckClient,
        manheim: ManheimClient,
        demo: DemoResponder,
    ) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            marketcheck,
            manheim,
            demo: Arc::new(demo),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Both provider clients share one timeout-bounded HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_client(config.provider_timeout())?;

        Ok(Self::new(
            ResponseCache::new(config.default_ttl()),
            MarketCheckClient::new(
                http.clone(),
                &config.marketcheck_base_url,
                config.marketcheck_api_key.clone(),
            ),
            ManheimClient::new(
                http,
                &config.manheim_base_url,
                config.manheim_access_token.clone(),
            ),
            DemoResponder::new(config.demo_mode, config.demo_data_dir.clone()),
        ))
    }

    /// Returns the cached value, or runs `fetch` and caches its result.
    async fn cached_or_fetch<F, Fut>(
        &self,
        endpoint: &str,
        params: Value,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<DataResponse<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let hit = self.cache.write().await.get(endpoint, &params);
        if let Some(data) = hit {
            debug!(endpoint, "cache hit");
            return Ok(DataResponse::cached(data));
        }

        let data = fetch().await?;
        self.cache
            .write()
            .await
            .set(endpoint, &params, data.clone(), ttl);

        Ok(DataResponse::fresh(data))
    }
}

// == Extractor Helpers ==
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

// == VIN Reports ==
/// Handler for POST /api/vindata/generate-report
///
/// Runs only the generate step (with its fallback) and reports whether the
/// data came back directly or a report id must be accessed next.
pub async fn generate_report_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VinRequest>, JsonRejection>,
) -> Result<Json<GenerateReportResponse>> {
    let vin = json_body(payload)?.vin()?;
    info!(vin = %vin, "generating VIN report");

    let generated = VinReportFlow::new(&state.marketcheck).generate(&vin).await?;
    let endpoint = generated.endpoint().to_string();

    let response = match generated.outcome {
        GenerateOutcome::Direct(data) => GenerateReportResponse {
            success: true,
            endpoint,
            has_direct_data: true,
            report_id: None,
            data: Some(data),
        },
        GenerateOutcome::Pending(report_id) => GenerateReportResponse {
            success: true,
            endpoint,
            has_direct_data: false,
            report_id: Some(report_id),
            data: None,
        },
    };

    Ok(Json(response))
}

/// Handler for POST /api/vindata/access-report
pub async fn access_report_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AccessReportRequest>, JsonRejection>,
) -> Result<Json<VinReportResponse>> {
    let report_id = json_body(payload)?.report_id()?;

    let data = VinReportFlow::new(&state.marketcheck)
        .access(&report_id)
        .await?;

    Ok(Json(VinReportResponse {
        success: true,
        data,
        endpoint: ACCESS_ENDPOINT.to_string(),
        report_id: Some(report_id),
        cached: false,
    }))
}

/// Handler for POST /api/vindata/report
pub async fn vin_report_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VinRequest>, JsonRejection>,
) -> Result<Json<VinReportResponse>> {
    let request = json_body(payload)?;
    resolve_vin_report(&state, request).await.map(Json)
}

/// Handler for GET /api/vindata/report?vin=
pub async fn vin_report_query_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<VinRequest>, QueryRejection>,
) -> Result<Json<VinReportResponse>> {
    let request = query_params(query)?;
    resolve_vin_report(&state, request).await.map(Json)
}

async fn resolve_vin_report(state: &AppState, request: VinRequest) -> Result<VinReportResponse> {
    let vin = request.vin()?;
    let params = json!({ "vin": vin });

    let hit = state.cache.write().await.get(cache::VIN_REPORT, &params);
    if let Some(cached) = hit {
        debug!(vin = %vin, "VIN report served from cache");
        return Ok(VinReportResponse {
            success: true,
            data: cached.get("data").cloned().unwrap_or(Value::Null),
            endpoint: cached
                .get("endpoint")
                .and_then(Value::as_str)
                .unwrap_or(ACCESS_ENDPOINT)
                .to_string(),
            report_id: cached
                .get("reportId")
                .and_then(Value::as_str)
                .map(str::to_string),
            cached: true,
        });
    }

    let report = VinReportFlow::new(&state.marketcheck).resolve(&vin).await?;
    info!(vin = %vin, endpoint = report.endpoint, "VIN report resolved");

    state.cache.write().await.set(
        cache::VIN_REPORT,
        &params,
        json!({
            "data": report.data,
            "endpoint": report.endpoint,
            "reportId": report.report_id,
        }),
        Some(VIN_REPORT_TTL),
    );

    Ok(VinReportResponse {
        success: true,
        data: report.data,
        endpoint: report.endpoint.to_string(),
        report_id: report.report_id,
        cached: false,
    })
}

/// Handler for POST /api/vindata/history
///
/// Vehicle history lookups are switched off.
pub async fn history_handler() -> AppError {
    AppError::Disabled("VIN history lookups are currently disabled".to_string())
}

// == Market Data ==
/// Handler for POST /api/vindata/valuation
pub async fn valuation_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VehicleRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Value>>> {
    let request = json_body(payload)?;
    let vin = request.vin()?;
    let zip = request.zip();
    let dealer_type = request.dealer_type();
    let params = json!({
        "vin": vin,
        "miles": request.miles,
        "zip": zip,
        "dealer_type": dealer_type,
    });

    state
        .cached_or_fetch(cache::MARKET_VALUE, params, Some(MARKET_TTL), || {
            state
                .marketcheck
                .predict_price(&vin, request.miles, zip.as_deref(), dealer_type.as_deref())
        })
        .await
        .map(Json)
}

/// Handler for POST /api/vindata/mmr
///
/// Returns the normalized Manheim valuation.
pub async fn mmr_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<VehicleRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Value>>> {
    let request = json_body(payload)?;
    let vin = request.vin()?;
    let zip = request.zip();
    let params = json!({ "vin": vin, "miles": request.miles, "zip": zip });

    state
        .cached_or_fetch(cache::MMR, params, Some(MARKET_TTL), || async {
            let raw = state
                .manheim
                .valuation(&vin, request.miles, zip.as_deref())
                .await?;
            let normalized =
                normalize_manheim_response(Some(&raw)).ok_or_else(|| AppError::Provider {
                    status: 404,
                    message: "No valuation data returned for this VIN".to_string(),
                    details: None,
                })?;
            serde_json::to_value(normalized).map_err(|e| AppError::Internal(e.to_string()))
        })
        .await
        .map(Json)
}

/// Handler for GET /api/vindata/demand-score?vin=
///
/// Only the VIN is sent to the provider.
pub async fn demand_score_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<VinRequest>, QueryRejection>,
) -> Result<Json<DataResponse<Value>>> {
    let vin = query_params(query)?.vin()?;
    let params = json!({ "vin": vin });

    state
        .cached_or_fetch(cache::DEMAND_SCORE, params, Some(MARKET_TTL), || {
            state.marketcheck.market_days_supply(&vin)
        })
        .await
        .map(Json)
}

/// Handler for GET /api/vindata/search
pub async fn search_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Value>>> {
    let query = query_params(query)?;
    query.validate()?;

    let pairs = query.to_query_pairs();
    let params = Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect(),
    );

    state
        .cached_or_fetch(cache::SEARCH, params, None, || {
            state.marketcheck.search_active(&pairs)
        })
        .await
        .map(Json)
}

/// Handler for GET /api/vindata/listing/:id
pub async fn listing_handler(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> Result<Json<DataResponse<Value>>> {
    let listing_id = listing_id.trim().to_string();
    if listing_id.is_empty() {
        return Err(AppError::InvalidRequest("Listing id is required".to_string()));
    }
    let params = json!({ "id": listing_id });

    state
        .cached_or_fetch(cache::LISTING, params, None, || {
            state.marketcheck.listing(&listing_id)
        })
        .await
        .map(Json)
}

// == Cache Administration ==
/// Handler for GET /api/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(CacheStatsResponse::from(&stats))
}

/// Handler for DELETE /api/cache[?endpoint=]
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<CacheClearQuery>, QueryRejection>,
) -> Result<Json<CacheClearResponse>> {
    let endpoint = query_params(query)?
        .endpoint
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    let removed = state.cache.write().await.clear(endpoint.as_deref());
    info!(endpoint = endpoint.as_deref().unwrap_or("*"), removed, "cache cleared");

    Ok(Json(CacheClearResponse {
        success: true,
        removed,
        endpoint,
    }))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.demo.is_enabled()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    /// State whose providers point at a closed port; only usable for paths
    /// that never reach a provider.
    fn offline_state() -> AppState {
        AppState::new(
            ResponseCache::new(Duration::from_secs(300)),
            MarketCheckClient::new(Client::new(), "http://127.0.0.1:9", Some("key".into())),
            ManheimClient::new(Client::new(), "http://127.0.0.1:9", Some("token".into())),
            DemoResponder::disabled(),
        )
    }

    fn vin_body(vin: &str) -> std::result::Result<Json<VinRequest>, JsonRejection> {
        Ok(Json(VinRequest {
            vin: Some(vin.to_string()),
        }))
    }

    #[tokio::test]
    async fn test_generate_report_rejects_short_vin() {
        let result = generate_report_handler(State(offline_state()), vin_body("SHORT")).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_vin_report_served_from_cache() {
        let state = offline_state();
        state.cache.write().await.set(
            cache::VIN_REPORT,
            &json!({"vin": "1HGCM82633A004352"}),
            json!({"data": {"owners": 2}, "endpoint": "access-report", "reportId": "r-7"}),
            None,
        );

        let response = vin_report_handler(State(state), vin_body("1hgcm82633a004352"))
            .await
            .unwrap();

        assert!(response.cached);
        assert_eq!(response.data, json!({"owners": 2}));
        assert_eq!(response.report_id.as_deref(), Some("r-7"));
    }

    #[tokio::test]
    async fn test_valuation_served_from_cache() {
        let state = offline_state();
        state.cache.write().await.set(
            cache::MARKET_VALUE,
            &json!({"vin": "1HGCM82633A004352", "miles": 42000, "zip": null, "dealer_type": null}),
            json!({"marketcheck_price": 18500}),
            None,
        );

        let request = VehicleRequest {
            vin: Some("1HGCM82633A004352".into()),
            miles: Some(42000),
            ..VehicleRequest::default()
        };
        let response = valuation_handler(State(state), Ok(Json(request)))
            .await
            .unwrap();

        assert!(response.cached);
        assert_eq!(response.data["marketcheck_price"], 18500);
    }

    #[tokio::test]
    async fn test_history_is_disabled() {
        let err = history_handler().await;
        assert!(matches!(err, AppError::Disabled(_)));
    }

    #[tokio::test]
    async fn test_clear_cache_by_endpoint() {
        let state = offline_state();
        {
            let mut cache = state.cache.write().await;
            cache.set(cache::VIN_REPORT, &json!({"vin": "A"}), json!(1), None);
            cache.set(cache::MARKET_VALUE, &json!({"vin": "A"}), json!(2), None);
        }

        let query = Ok(Query(CacheClearQuery {
            endpoint: Some("vin-report".into()),
        }));
        let response = clear_cache_handler(State(state.clone()), query).await.unwrap();

        assert_eq!(response.removed, 1);
        assert_eq!(state.cache.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_stats_handler() {
        let state = offline_state();
        {
            let mut cache = state.cache.write().await;
            cache.set(cache::LISTING, &json!({"id": "L1"}), json!(1), None);
            cache.get(cache::LISTING, &json!({"id": "L1"}));
            cache.get(cache::LISTING, &json!({"id": "L2"}));
        }

        let response = cache_stats_handler(State(state)).await;
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
        assert_eq!(response.total_entries, 1);
        assert!((response.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(offline_state())).await;
        assert_eq!(response.status, "healthy");
        assert!(!response.demo_mode);
    }
}
