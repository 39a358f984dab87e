//! `GET /api/auth/alerts`: the caller's alert history, newest first.

use axum::extract::State;
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{AlertRecord, AuthUser};

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AlertRecord>>, ApiError> {
    let alerts = ctx
        .with_db(move |conn| Ok(db::list_alerts_for_user(conn, user.id)?))
        .await?;
    Ok(Json(alerts))
}
