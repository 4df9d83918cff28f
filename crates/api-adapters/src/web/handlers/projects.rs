use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domains::ManagedRecord;
use serde::Deserialize;
use services::{NewProject, RecordPatch};
use uuid::Uuid;

use crate::web::{ApiError, AppState, CurrentActor};

#[derive(Debug, Deserialize)]
pub struct ClaimBody {
    pub legacy_id: String,
}

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(project): Json<NewProject>,
) -> Result<(StatusCode, Json<ManagedRecord>), ApiError> {
    let record = state.projects.create(&actor, project).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /api/projects/{id}
pub async fn edit(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(patch): Json<RecordPatch>,
) -> Result<Json<ManagedRecord>, ApiError> {
    Ok(Json(state.projects.edit(id, patch, &actor).await?))
}

/// POST /api/projects/{id}/claim
pub async fn claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(body): Json<ClaimBody>,
) -> Result<Json<ManagedRecord>, ApiError> {
    Ok(Json(state.projects.claim(id, &body.legacy_id, &actor).await?))
}

/// POST /api/projects/{id}/publish
pub async fn publish(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<ManagedRecord>, ApiError> {
    Ok(Json(state.projects.publish(id, &actor).await?))
}

/// POST /api/projects/{id}/unpublish
pub async fn unpublish(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<ManagedRecord>, ApiError> {
    Ok(Json(state.projects.unpublish(id, &actor).await?))
}
