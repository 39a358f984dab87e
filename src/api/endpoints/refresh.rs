//! `POST /api/refresh`: exchange a refresh token for a new access token.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

pub async fn refresh(
    State(ctx): State<ApiContext>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let Json(body) = body?;
    let claims = ctx.tokens.verify_refresh(body.refresh_token.trim())?;
    let access_token = ctx.tokens.issue_access(&claims.user)?;

    tracing::debug!(user_id = claims.user.id, "Access token refreshed");
    Ok(Json(RefreshResponse { access_token }))
}
