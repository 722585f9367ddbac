//! Demo Mode Module
//!
//! Serves static JSON fixtures in place of provider calls so demonstrations
//! never hit paid APIs. The switch is read once at start-up.

mod middleware;
mod responder;

pub use middleware::demo_intercept;
pub use responder::{DemoResponder, DemoResponse, API_PREFIX, FIXTURE_EXTENSION};
