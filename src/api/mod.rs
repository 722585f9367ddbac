//! API Module
//!
//! HTTP handlers and routing for the gateway.
//!
//! # Endpoints
//! - `GET /health` - Health check
//! - `GET /api/cache/stats` - Response cache statistics
//! - `DELETE /api/cache` - Clear the cache, optionally one endpoint
//! - `POST /api/vindata/generate-report` - Generate a VIN report
//! - `POST /api/vindata/access-report` - Fetch a report by id
//! - `POST|GET /api/vindata/report` - Full VIN report flow (cached)
//! - `POST /api/vindata/valuation` - MarketCheck price prediction (cached)
//! - `POST /api/vindata/mmr` - Normalized Manheim MMR (cached)
//! - `GET /api/vindata/demand-score` - Market days supply (cached)
//! - `GET /api/vindata/search` - Active listing search (cached)
//! - `GET /api/vindata/listing/:id` - Listing detail (cached)
//! - `POST /api/vindata/history` - Disabled, always 503

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
