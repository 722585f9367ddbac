//! Provider Clients Module
//!
//! Thin clients for the third-party data providers. Each call builds the
//! provider URL, sends it with the shared timeout-bounded HTTP client and
//! hands back the parsed JSON body or an [`AppError`](crate::error::AppError).

pub mod http;
pub mod manheim;
pub mod marketcheck;

pub use http::build_client;
pub use manheim::ManheimClient;
pub use marketcheck::MarketCheckClient;
