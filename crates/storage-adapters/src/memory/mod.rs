//! # In-memory adapters
//!
//! Lock-free (sharded) implementations of every port. Used by tests and by
//! the binary when no database is configured.

mod legacy;
mod moderation_log;
mod owners;
mod records;
mod suppression;

pub use legacy::InMemoryLegacyCatalog;
pub use moderation_log::InMemoryModerationLog;
pub use owners::InMemoryOwnerDirectory;
pub use records::InMemoryRecordStore;
pub use suppression::InMemorySuppressionRegistry;
