use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{BpStatus, NewReading, PulseStatus, Reading};

const READING_COLUMNS: &str = "id, user_id, systolic, diastolic, pulse, bp_status, pulse_status,
     clinical_bp_label, timestamp, recorded_at";

/// Presentation order for windowed reading queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingOrder {
    NewestFirst,
    OldestFirst,
}

impl ReadingOrder {
    fn sql(self) -> &'static str {
        match self {
            ReadingOrder::NewestFirst => "DESC",
            ReadingOrder::OldestFirst => "ASC",
        }
    }
}

/// Insert a reading unless one already exists for the same owner and
/// submitted timestamp.
///
/// Returns the new row id, or `None` when the unique index rejected the row.
/// The check and the insert are a single statement, so two concurrent
/// submissions of the same reading cannot both land.
pub fn insert_reading_if_absent(
    conn: &Connection,
    reading: &NewReading,
) -> Result<Option<i64>, DatabaseError> {
    let affected = conn.execute(
        "INSERT INTO bp_readings (user_id, systolic, diastolic, pulse, bp_status, pulse_status,
                                  clinical_bp_label, timestamp, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT (user_id, timestamp) DO NOTHING",
        params![
            reading.user_id,
            reading.systolic,
            reading.diastolic,
            reading.pulse,
            reading.classification.bp_status.as_str(),
            reading.classification.pulse_status.as_str(),
            reading.classification.clinical_bp_label,
            reading.timestamp,
            reading.recorded_at,
        ],
    )?;
    if affected == 0 {
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

/// Look up the caller's reading with exactly this submitted timestamp.
pub fn find_reading_by_timestamp(
    conn: &Connection,
    user_id: i64,
    timestamp: &str,
) -> Result<Option<Reading>, DatabaseError> {
    let sql = format!(
        "SELECT {READING_COLUMNS} FROM bp_readings WHERE user_id = ?1 AND timestamp = ?2 LIMIT 1"
    );
    let row = conn
        .query_row(&sql, params![user_id, timestamp], row_to_raw)
        .optional()?;
    row.map(reading_from_raw).transpose()
}

/// Readings for one user with `start <= recorded_at <= end`.
///
/// Bounds are UTC strings in the same `%Y-%m-%dT%H:%M:%S%.3fZ` format as
/// `recorded_at`, so text comparison orders them chronologically.
pub fn query_readings(
    conn: &Connection,
    user_id: i64,
    start: &str,
    end: &str,
    order: ReadingOrder,
) -> Result<Vec<Reading>, DatabaseError> {
    let sql = format!(
        "SELECT {READING_COLUMNS} FROM bp_readings
         WHERE user_id = ?1 AND recorded_at >= ?2 AND recorded_at <= ?3
         ORDER BY recorded_at {order}, id {order}",
        order = order.sql(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, start, end], row_to_raw)?;

    let mut readings = Vec::new();
    for row in rows {
        readings.push(reading_from_raw(row?)?);
    }
    Ok(readings)
}

struct ReadingRow {
    id: i64,
    user_id: i64,
    systolic: i32,
    diastolic: i32,
    pulse: i32,
    bp_status: String,
    pulse_status: String,
    clinical_bp_label: String,
    timestamp: String,
    recorded_at: String,
}

fn row_to_raw(row: &rusqlite::Row) -> Result<ReadingRow, rusqlite::Error> {
    Ok(ReadingRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        systolic: row.get(2)?,
        diastolic: row.get(3)?,
        pulse: row.get(4)?,
        bp_status: row.get(5)?,
        pulse_status: row.get(6)?,
        clinical_bp_label: row.get(7)?,
        timestamp: row.get(8)?,
        recorded_at: row.get(9)?,
    })
}

fn reading_from_raw(row: ReadingRow) -> Result<Reading, DatabaseError> {
    let bp_status = BpStatus::from_str(&row.bp_status).ok_or_else(|| DatabaseError::InvalidEnum {
        field: "bp_status".into(),
        value: row.bp_status.clone(),
    })?;
    let pulse_status =
        PulseStatus::from_str(&row.pulse_status).ok_or_else(|| DatabaseError::InvalidEnum {
            field: "pulse_status".into(),
            value: row.pulse_status.clone(),
        })?;

    Ok(Reading {
        id: row.id,
        user_id: row.user_id,
        systolic: row.systolic,
        diastolic: row.diastolic,
        pulse: row.pulse,
        bp_status,
        pulse_status,
        clinical_bp_label: row.clinical_bp_label,
        timestamp: row.timestamp,
        recorded_at: row.recorded_at,
    })
}
