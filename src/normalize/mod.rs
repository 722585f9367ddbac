//! Provider Response Normalizers
//!
//! One pure function per provider turning its loosely-shaped payload into a
//! fixed internal shape.

pub mod manheim;

pub use manheim::{normalize_manheim_response, Adjustment, NormalizedValuation, ValuationMetadata};
