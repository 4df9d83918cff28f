use axum::extract::{Path, Query, State};
use axum::Json;
use domains::ModerationAction;
use services::ModerationRequest;
use uuid::Uuid;

use super::catalog::LimitParams;
use crate::web::{ApiError, AppState, CurrentActor};

/// POST /api/moderation
pub async fn apply(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<ModerationRequest>,
) -> Result<Json<ModerationAction>, ApiError> {
    let action = state.moderation.apply(request, &actor).await?;
    state.metrics.record_moderation(action.action_type);
    Ok(Json(action))
}

/// POST /api/moderation/{id}/acknowledge
pub async fn acknowledge(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<ModerationAction>, ApiError> {
    Ok(Json(state.moderation.acknowledge(id, &actor).await?))
}

/// GET /api/moderation/reviews
pub async fn pending_reviews(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ModerationAction>>, ApiError> {
    let limit = state.limits.page(params.limit);
    Ok(Json(state.moderation.pending_reviews(&actor, limit).await?))
}

/// GET /api/moderation/notices
pub async fn notices(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ModerationAction>>, ApiError> {
    let limit = state.limits.page(params.limit);
    Ok(Json(state.moderation.notices_for(&actor, limit).await?))
}

/// GET /api/moderation/history/{identifier}
pub async fn history(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(identifier): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ModerationAction>>, ApiError> {
    let limit = state.limits.page(params.limit);
    Ok(Json(state.moderation.history(&identifier, &actor, limit).await?))
}
