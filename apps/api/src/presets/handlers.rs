//! Axum route handlers for the Preset API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::preset::Preset;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpsertPresetRequest {
    pub name: String,
    #[serde(default)]
    pub settings: Value,
}

/// GET /api/v1/presets
///
/// Every preset comes back with a complete config; missing fields are filled.
pub async fn handle_list_presets(
    State(state): State<AppState>,
) -> Result<Json<Vec<Preset>>, AppError> {
    Ok(Json(state.presets.list().await?))
}

/// PUT /api/v1/presets/:id
pub async fn handle_upsert_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpsertPresetRequest>, JsonRejection>,
) -> Result<Json<Preset>, AppError> {
    let Json(req) = payload?;
    let preset = state.presets.upsert(&id, &req.name, req.settings).await?;
    Ok(Json(preset))
}

/// DELETE /api/v1/presets/:id
pub async fn handle_delete_preset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.presets.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
