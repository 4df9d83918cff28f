use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{ContentItem, ContentSource};
use serde::{Deserialize, Serialize};
use services::{FeedQuery, SimilarityReference};

use crate::web::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub items: Vec<ContentItem>,
    /// Sources left out because they failed; empty on a complete feed
    pub degraded: Vec<ContentSource>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

/// GET /api/feed?limit=&include_archived=
pub async fn feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<FeedResponse>, ApiError> {
    let query = FeedQuery {
        limit: state.limits.feed(params.limit),
        include_archived: params.include_archived,
    };
    let outcome = state.feed.collect(query).await?;
    state.metrics.record_feed(&outcome.degraded);
    Ok(Json(FeedResponse { items: outcome.items, degraded: outcome.degraded }))
}

/// GET /api/items/{identifier}
pub async fn resolve(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<ContentItem>, ApiError> {
    Ok(Json(state.resolution.resolve(&identifier).await?))
}

/// GET /api/items/{identifier}/similar?limit=
pub async fn similar(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ContentItem>>, ApiError> {
    let item = state.resolution.resolve(&identifier).await?;
    let reference = SimilarityReference::from(&item);
    let picks = state
        .similarity
        .similar_to(&reference, state.limits.similar(params.limit))
        .await?;
    Ok(Json(picks))
}
