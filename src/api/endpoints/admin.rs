//! Admin views of any user's windowed history, oldest first.
//!
//! - `GET /api/auth/admin/readings/:id`: z-scored readings
//! - `GET /api/auth/admin/readings/:id/stats`: window statistics

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::ReadingOrder;
use crate::vitals::{self, ScoredReading, WindowQuery, WindowStats};

async fn user_window(
    ctx: &ApiContext,
    user_id: i64,
    query: WindowQuery,
) -> Result<Vec<ScoredReading>, ApiError> {
    let now = ctx.config.window_now();
    ctx.with_db(move |conn| {
        Ok(vitals::query_readings(
            conn,
            user_id,
            &query,
            &now,
            ReadingOrder::OldestFirst,
        )?)
    })
    .await
}

pub async fn readings(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<Vec<ScoredReading>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(user_window(&ctx, user_id, query).await?))
}

pub async fn stats(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<i64>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<WindowStats>, ApiError> {
    let Query(query) = query?;
    let readings = user_window(&ctx, user_id, query).await?;
    let plain: Vec<_> = readings.into_iter().map(|r| r.reading).collect();
    Ok(Json(vitals::summarize(&plain)))
}
