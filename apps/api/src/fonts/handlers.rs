//! Axum route handlers for custom fonts.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::models::font::CustomFont;
use crate::state::AppState;

/// Multipart field carrying the font binary.
const FONT_FIELD: &str = "font";

/// GET /api/v1/fonts
pub async fn handle_list_fonts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomFont>>, AppError> {
    Ok(Json(state.fonts.list().await?))
}

/// POST /api/v1/fonts
///
/// Multipart upload with one `font` file field. The client file name supplies
/// both the display name and the format.
pub async fn handle_upload_font(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CustomFont>), AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some(FONT_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("font field has no file name".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read font: {e}")))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload
        .ok_or_else(|| AppError::Validation(format!("No '{FONT_FIELD}' field found")))?;
    let font = state.fonts.upload(data, &file_name).await?;
    Ok((StatusCode::CREATED, Json(font)))
}

/// DELETE /api/v1/fonts/:file_name
pub async fn handle_delete_font(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.fonts.delete(&file_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /fonts/:file_name
///
/// Serves the binary behind a font's `url`. Stored names are unique per upload,
/// so responses can be cached indefinitely.
pub async fn handle_serve_font(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (data, format) = state.fonts.fetch(&file_name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type()),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    ))
}
