//! indie-catalog/crates/domains/src/lib.rs
//!
//! Domain models and port definitions for the catalog engine.
//! Nothing in this crate performs I/O.

pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
