//! Axum router and shared request state.

mod auth;
mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use domains::IdentityVerifier;
use services::{
    FeedAggregator, ModerationService, ProjectService, ResolutionService, SimilarityScorer,
};
use tower_http::trace::TraceLayer;

use crate::metrics::CatalogMetrics;

pub use auth::CurrentActor;
pub use error::ApiError;

/// Limits applied to query parameters before they reach the services.
#[derive(Debug, Clone, Copy)]
pub struct ApiLimits {
    pub feed_default: usize,
    pub feed_max: usize,
    pub similar_default: usize,
    pub similar_max: usize,
    pub moderation_page: usize,
}

impl Default for ApiLimits {
    fn default() -> Self {
        Self {
            feed_default: 24,
            feed_max: 100,
            similar_default: 6,
            similar_max: 24,
            moderation_page: 50,
        }
    }
}

impl ApiLimits {
    fn feed(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.feed_default).min(self.feed_max)
    }

    fn similar(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.similar_default).min(self.similar_max)
    }

    fn page(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.moderation_page).min(self.moderation_page)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub resolution: Arc<ResolutionService>,
    pub feed: Arc<FeedAggregator>,
    pub similarity: Arc<SimilarityScorer>,
    pub moderation: Arc<ModerationService>,
    pub projects: Arc<ProjectService>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub metrics: Arc<CatalogMetrics>,
    pub limits: ApiLimits,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::health::metrics))
        .route("/api/feed", get(handlers::catalog::feed))
        .route("/api/items/{identifier}", get(handlers::catalog::resolve))
        .route("/api/items/{identifier}/similar", get(handlers::catalog::similar))
        .route("/api/moderation", post(handlers::moderation::apply))
        .route("/api/moderation/reviews", get(handlers::moderation::pending_reviews))
        .route("/api/moderation/notices", get(handlers::moderation::notices))
        .route("/api/moderation/history/{identifier}", get(handlers::moderation::history))
        .route("/api/moderation/{id}/acknowledge", post(handlers::moderation::acknowledge))
        .route("/api/projects", post(handlers::projects::create))
        .route("/api/projects/{id}", patch(handlers::projects::edit))
        .route("/api/projects/{id}/claim", post(handlers::projects::claim))
        .route("/api/projects/{id}/publish", post(handlers::projects::publish))
        .route("/api/projects/{id}/unpublish", post(handlers::projects::unpublish))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
