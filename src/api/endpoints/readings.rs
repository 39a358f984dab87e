//! Reading endpoints.
//!
//! - `POST /api/auth/bp`: ingest one reading
//! - `GET /api/auth/bp`: windowed, z-scored history
//! - `POST /api/auth/bp/import`: ingest the sheet's latest reading

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::api::error::{ApiError, MessageBody};
use crate::api::types::ApiContext;
use crate::db::ReadingOrder;
use crate::models::AuthUser;
use crate::vitals::{
    self, IngestOutcome, ReadingSubmission, ScoredReading, SubmittedTimestamp, WindowQuery,
};

pub const SAVED_MESSAGE: &str = "Blood pressure saved";
pub const DUPLICATE_MESSAGE: &str = "Same data";

fn outcome_response(outcome: IngestOutcome) -> (StatusCode, Json<MessageBody>) {
    match outcome {
        IngestOutcome::Saved { .. } => (StatusCode::CREATED, Json(MessageBody::new(SAVED_MESSAGE))),
        IngestOutcome::Duplicate => (StatusCode::OK, Json(MessageBody::new(DUPLICATE_MESSAGE))),
    }
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<ReadingSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let Json(submission) = body?;
    let workflow = ctx.ingestion.clone();

    let outcome = ctx
        .with_db(move |conn| Ok(workflow.submit(conn, &user, &submission)?))
        .await?;
    Ok(outcome_response(outcome))
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<Vec<ScoredReading>>, ApiError> {
    let Query(query) = query?;
    let now = ctx.config.window_now();
    let readings = ctx
        .with_db(move |conn| {
            Ok(vitals::query_readings(
                conn,
                user.id,
                &query,
                &now,
                ReadingOrder::NewestFirst,
            )?)
        })
        .await?;
    Ok(Json(readings))
}

pub async fn import(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let sheet = ctx.sheet.clone();
    let workflow = ctx.ingestion.clone();

    let outcome = ctx
        .with_db(move |conn| {
            let latest = sheet.latest()?;
            let submission = ReadingSubmission {
                systolic: latest.systolic,
                diastolic: latest.diastolic,
                pulse: latest.pulse,
                timestamp: SubmittedTimestamp::Text(latest.timestamp),
            };
            Ok(workflow.submit(conn, &user, &submission)?)
        })
        .await?;
    Ok(outcome_response(outcome))
}
