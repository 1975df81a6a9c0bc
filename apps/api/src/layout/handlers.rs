//! Axum route handler for rendering badge pages.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::layout::fonts::FontReadiness;
use crate::layout::pipeline::{render_records, RenderOutcome, RenderTarget};
use crate::layout::style::LayoutConfig;
use crate::models::record::CardRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Decoded one by one; a malformed record renders blank in its slot.
    pub records: Vec<Value>,
    /// Decoded leniently; anything unusable falls back to defaults.
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub target: RenderTarget,
    /// Families the client has finished loading. Absent means every font is
    /// ready (print path).
    #[serde(default)]
    pub loaded_fonts: Option<Vec<String>>,
}

/// POST /api/v1/render
pub async fn handle_render(
    State(state): State<AppState>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderOutcome>, AppError> {
    let Json(req) = payload?;
    let config = LayoutConfig::from_json_lenient(req.config);
    let records: Vec<CardRecord> = req
        .records
        .into_iter()
        .map(CardRecord::from_json_lenient)
        .collect();

    let fonts = match req.loaded_fonts {
        None => FontReadiness::AllReady,
        Some(loaded) => {
            let custom = state.fonts.list().await?.into_iter().map(|f| f.name);
            FontReadiness::loaded(custom, loaded)
        }
    };

    let outcome = render_records(records, config, fonts, req.target).await?;
    if outcome.provisional {
        tracing::warn!("Render used fallback fonts; a second pass is due once fonts load");
    }
    Ok(Json(outcome))
}
