//! # storage-adapters
//!
//! Concrete implementations of the `domains` ports.
//!
//! - [`memory`]: dashmap-backed adapters, always compiled.
//! - `postgres`: sqlx adapters, behind the `db-postgres` feature.
//! - [`cache`]: TTL cache in front of any suppression registry.
//! - [`notifier`]: tracing-backed and recording notifiers.

pub mod cache;
pub mod memory;
pub mod notifier;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use cache::CachedSuppressionRegistry;
pub use notifier::{LogNotifier, RecordingNotifier};
