//! # services
//!
//! The content unification and moderation engine. Every service is a thin,
//! stateless struct over `Arc<dyn Port>` handles, so a request can be served
//! from any task without shared locks.

pub mod feed;
pub mod moderation;
pub mod projects;
pub mod resolution;
pub mod similarity;
pub mod slug;

pub use feed::{FeedAggregator, FeedOutcome, FeedQuery};
pub use moderation::{ModerationRequest, ModerationService};
pub use projects::{NewProject, ProjectService, RecordPatch};
pub use resolution::{ResolutionService, MAX_RESOLUTION_DEPTH};
pub use similarity::{SimilarityReference, SimilarityScorer};
