//! # api-adapters
//!
//! The HTTP surface of the catalog engine. Handlers only translate between
//! JSON and service calls; every rule lives in `services`.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::CatalogMetrics;

#[cfg(feature = "web-axum")]
pub use web::{router, ApiLimits, AppState};
