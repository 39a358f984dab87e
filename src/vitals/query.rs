//! Windowed reading history with z-score annotation.

use chrono::{DateTime, TimeZone};
use rusqlite::Connection;
use thiserror::Error;

use super::window::{resolve_window, TimeFilter, WindowError, WindowQuery};
use super::zscore::{annotate, ScoredReading};
use crate::db::{self, DatabaseError, ReadingOrder};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Resolve the window for `query`, fetch the user's readings inside it and
/// annotate them. Z-scores are relative to this window only.
pub fn query_readings<Tz: TimeZone>(
    conn: &Connection,
    user_id: i64,
    query: &WindowQuery,
    now: &DateTime<Tz>,
    order: ReadingOrder,
) -> Result<Vec<ScoredReading>, QueryError> {
    let filter = TimeFilter::parse(query.filter.as_deref())?;
    let window = resolve_window(filter, query.from.as_deref(), query.to.as_deref(), now)?;
    let (start, end) = window.utc_bounds();

    let readings = db::query_readings(conn, user_id, &start, &end, order)?;
    tracing::debug!(
        user_id,
        filter = filter.as_str(),
        %start,
        %end,
        count = readings.len(),
        "Readings queried"
    );
    Ok(annotate(&readings))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{BpStatus, Classification, NewReading, PulseStatus};
    use crate::vitals::window::format_utc;

    fn insert(conn: &Connection, user_id: i64, systolic: i32, at: DateTime<Utc>) {
        let recorded_at = format_utc(&at);
        db::insert_reading_if_absent(
            conn,
            &NewReading {
                user_id,
                systolic,
                diastolic: 80,
                pulse: 70,
                classification: Classification {
                    bp_status: BpStatus::Normal,
                    pulse_status: PulseStatus::Normal,
                    clinical_bp_label: format!("Normal ({systolic}/80 mmHg)"),
                },
                timestamp: recorded_at.clone(),
                recorded_at,
            },
        )
        .unwrap();
    }

    fn query(filter: Option<&str>, from: Option<&str>, to: Option<&str>) -> WindowQuery {
        WindowQuery {
            filter: filter.map(String::from),
            from: from.map(String::from),
            to: to.map(String::from),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn default_filter_is_today_newest_first() {
        let conn = open_memory_database().unwrap();
        insert(&conn, 1, 110, now() - Duration::hours(2));
        insert(&conn, 1, 120, now() - Duration::hours(1));
        insert(&conn, 1, 130, now() - Duration::days(1));

        let out = query_readings(&conn, 1, &WindowQuery::default(), &now(), ReadingOrder::NewestFirst)
            .unwrap();
        let systolic: Vec<i32> = out.iter().map(|r| r.reading.systolic).collect();
        assert_eq!(systolic, [120, 110]);
        // two-point window: each sits one sd from the mean
        assert!((out[0].z_score.systolic - 1.0).abs() < 1e-9);
        assert!((out[1].z_score.systolic + 1.0).abs() < 1e-9);
    }

    #[test]
    fn oldest_first_order() {
        let conn = open_memory_database().unwrap();
        insert(&conn, 1, 110, now() - Duration::hours(2));
        insert(&conn, 1, 120, now() - Duration::hours(1));

        let out = query_readings(&conn, 1, &query(Some("daily"), None, None), &now(), ReadingOrder::OldestFirst)
            .unwrap();
        let systolic: Vec<i32> = out.iter().map(|r| r.reading.systolic).collect();
        assert_eq!(systolic, [110, 120]);
    }

    #[test]
    fn other_users_readings_are_invisible() {
        let conn = open_memory_database().unwrap();
        insert(&conn, 1, 110, now() - Duration::hours(1));
        insert(&conn, 2, 180, now() - Duration::hours(1));

        let out = query_readings(&conn, 1, &WindowQuery::default(), &now(), ReadingOrder::NewestFirst)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reading.user_id, 1);
    }

    #[test]
    fn custom_range_is_inclusive() {
        let conn = open_memory_database().unwrap();
        insert(&conn, 1, 110, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        insert(&conn, 1, 120, Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
        insert(&conn, 1, 130, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
        insert(&conn, 1, 140, Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());

        let q = query(Some("custom"), Some("2024-03-01"), Some("2024-03-10T00:00:00Z"));
        let out = query_readings(&conn, 1, &q, &now(), ReadingOrder::OldestFirst).unwrap();
        let systolic: Vec<i32> = out.iter().map(|r| r.reading.systolic).collect();
        assert_eq!(systolic, [110, 120, 130]);
    }

    #[test]
    fn custom_without_to_names_the_field() {
        let conn = open_memory_database().unwrap();
        let q = query(Some("custom"), Some("2024-03-01"), None);
        let err = query_readings(&conn, 1, &q, &now(), ReadingOrder::NewestFirst).unwrap_err();
        assert!(matches!(err, QueryError::Window(WindowError::MissingParam("to"))));
        assert_eq!(err.to_string(), "Custom filter requires \"to\" query param");
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = query_readings(&conn, 1, &query(Some("yearly"), None, None), &now(), ReadingOrder::NewestFirst)
            .unwrap_err();
        assert!(matches!(err, QueryError::Window(WindowError::InvalidFilter(_))));
    }

    #[test]
    fn empty_window_returns_empty_list() {
        let conn = open_memory_database().unwrap();
        let out = query_readings(&conn, 1, &query(Some("hourly"), None, None), &now(), ReadingOrder::NewestFirst)
            .unwrap();
        assert!(out.is_empty());
    }
}
