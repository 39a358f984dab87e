//! `GET /api/bp-google-sheet`: the latest reading published by the sheet.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::sheet::SheetReading;

pub async fn latest(State(ctx): State<ApiContext>) -> Result<Json<SheetReading>, ApiError> {
    let sheet = ctx.sheet.clone();
    let reading = tokio::task::spawn_blocking(move || sheet.latest()).await??;
    Ok(Json(reading))
}
