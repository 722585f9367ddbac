//! Cache Module
//!
//! In-memory response cache keyed by logical endpoint and parameter set, with
//! per-entry TTL, lazy expiry on lookup and a periodic sweep.

mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::{cache_key, canonical_json};
pub use stats::CacheStats;
pub use store::ResponseCache;

// == Cache Endpoint Names ==
/// Full VIN report resolved by the two-step flow
pub const VIN_REPORT: &str = "vin-report";
/// MarketCheck price prediction
pub const MARKET_VALUE: &str = "market-value";
/// Normalized Manheim valuation
pub const MMR: &str = "mmr";
/// Market days supply for a VIN
pub const DEMAND_SCORE: &str = "demand-score";
/// Active listing search
pub const SEARCH: &str = "search";
/// Single listing detail
pub const LISTING: &str = "listing";
