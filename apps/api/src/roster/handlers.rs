//! Axum route handlers for roster import/export.

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;

use crate::errors::AppError;
use crate::models::record::CardRecord;
use crate::roster::csv_io::{export_csv, import_csv, RosterError};

impl From<RosterError> for AppError {
    fn from(e: RosterError) -> Self {
        match e {
            RosterError::Write(msg) => AppError::Internal(anyhow::anyhow!(msg)),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// POST /api/v1/records/import
///
/// Body is the raw CSV file.
pub async fn handle_import_records(body: Bytes) -> Result<Json<Vec<CardRecord>>, AppError> {
    let roster = import_csv(&body)?;
    tracing::info!("Imported {} records", roster.len());
    Ok(Json(roster.into_records()))
}

/// POST /api/v1/records/export
pub async fn handle_export_records(
    payload: Result<Json<Vec<CardRecord>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(records) = payload?;
    let csv = export_csv(&records)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"roster.csv\""),
        ],
        csv,
    ))
}
