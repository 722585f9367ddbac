//! VIN Intel - dealership inventory data gateway
//!
//! Proxies VIN reports, market pricing and Manheim MMR valuations with a TTL
//! response cache and an optional demo mode that serves static fixtures.

pub mod api;
pub mod cache;
pub mod config;
pub mod demo;
pub mod error;
pub mod models;
pub mod normalize;
pub mod providers;
pub mod tasks;
pub mod vin_report;

pub use api::AppState;
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::spawn_sweep_task;
