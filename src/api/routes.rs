//! API Routes
//!
//! Configures the Axum router. Every `/api/vindata` route sits behind the demo
//! route layer; health and cache administration never do.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    access_report_handler, cache_stats_handler, clear_cache_handler, demand_score_handler,
    generate_report_handler, health_handler, history_handler, listing_handler, mmr_handler,
    search_handler, valuation_handler, vin_report_handler, vin_report_query_handler, AppState,
};
use crate::demo::demo_intercept;

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - Demo mode: route layer over the provider-backed routes
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let vindata: Router<AppState> = Router::new()
        .route("/api/vindata/generate-report", post(generate_report_handler))
        .route("/api/vindata/access-report", post(access_report_handler))
        .route(
            "/api/vindata/report",
            post(vin_report_handler).get(vin_report_query_handler),
        )
        .route("/api/vindata/valuation", post(valuation_handler))
        .route("/api/vindata/mmr", post(mmr_handler))
        .route("/api/vindata/demand-score", get(demand_score_handler))
        .route("/api/vindata/search", get(search_handler))
        .route("/api/vindata/listing/:id", get(listing_handler))
        .route("/api/vindata/history", post(history_handler))
        .route_layer(middleware::from_fn_with_state(
            state.demo.clone(),
            demo_intercept,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/cache", delete(clear_cache_handler))
        .route("/api/cache/stats", get(cache_stats_handler))
        .merge(vindata)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
