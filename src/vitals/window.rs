//! Time-window resolution for reading queries.
//!
//! Calendar truncation (hour, midnight, Sunday, first of month) happens in
//! the timezone of `now`; the resolved bounds are then compared against
//! readings' UTC `recorded_at` via [`TimeWindow::utc_bounds`].

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta, TimeZone,
    Timelike, Utc,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("Invalid filter option")]
    InvalidFilter(String),

    #[error("Custom filter requires \"{0}\" query param")]
    MissingParam(&'static str),

    #[error("Invalid \"{0}\" date format")]
    InvalidDate(&'static str),

    #[error("\"from\" must not be after \"to\"")]
    InvertedRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl TimeFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeFilter::Hourly => "hourly",
            TimeFilter::Daily => "daily",
            TimeFilter::Weekly => "weekly",
            TimeFilter::Monthly => "monthly",
            TimeFilter::Custom => "custom",
        }
    }

    /// Parse a `filter` query value. Absent or empty means daily.
    pub fn parse(value: Option<&str>) -> Result<Self, WindowError> {
        match value.map(str::trim) {
            None | Some("") | Some("daily") => Ok(TimeFilter::Daily),
            Some("hourly") => Ok(TimeFilter::Hourly),
            Some("weekly") => Ok(TimeFilter::Weekly),
            Some("monthly") => Ok(TimeFilter::Monthly),
            Some("custom") => Ok(TimeFilter::Custom),
            Some(other) => Err(WindowError::InvalidFilter(other.to_string())),
        }
    }
}

/// Raw `filter`/`from`/`to` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    pub filter: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Inclusive `[start, end]` range in the caller's timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> TimeWindow<Tz> {
    /// Bounds formatted like `recorded_at` for text comparison in SQL.
    pub fn utc_bounds(&self) -> (String, String) {
        (
            format_utc(&self.start.with_timezone(&Utc)),
            format_utc(&self.end.with_timezone(&Utc)),
        )
    }
}

/// Canonical storage format: `2024-03-15T14:30:00.000Z`.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a date or date-time string.
///
/// Accepts RFC 3339 (any offset), a naive ISO date-time, or a bare date
/// (midnight). Naive forms are read as wall-clock time in `tz`.
pub fn parse_datetime<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(tz));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(at_local(tz, naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| at_local(tz, date.and_time(NaiveTime::MIN)))
}

/// Map a wall-clock time in `tz` to an instant. Ambiguous times take the
/// earlier instant; times inside a DST gap are read as UTC.
fn at_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

fn midnight_of<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    at_local(tz, date.and_time(NaiveTime::MIN))
}

/// Resolve a filter into a concrete range ending at `now` (or at `to`).
pub fn resolve_window<Tz: TimeZone>(
    filter: TimeFilter,
    from: Option<&str>,
    to: Option<&str>,
    now: &DateTime<Tz>,
) -> Result<TimeWindow<Tz>, WindowError> {
    let tz = now.timezone();
    let local = now.naive_local();
    let today = local.date();

    let start = match filter {
        TimeFilter::Hourly => {
            let into_hour = TimeDelta::minutes(i64::from(local.minute()))
                + TimeDelta::seconds(i64::from(local.second()))
                + TimeDelta::nanoseconds(i64::from(local.nanosecond()));
            now.clone() - into_hour
        }
        TimeFilter::Daily => midnight_of(&tz, today),
        TimeFilter::Weekly => {
            let back = TimeDelta::days(i64::from(today.weekday().num_days_from_sunday()));
            midnight_of(&tz, today - back)
        }
        TimeFilter::Monthly => midnight_of(&tz, today.with_day(1).unwrap_or(today)),
        TimeFilter::Custom => return resolve_custom(from, to, &tz),
    };

    Ok(TimeWindow {
        start,
        end: now.clone(),
    })
}

fn resolve_custom<Tz: TimeZone>(
    from: Option<&str>,
    to: Option<&str>,
    tz: &Tz,
) -> Result<TimeWindow<Tz>, WindowError> {
    let from = from
        .filter(|s| !s.trim().is_empty())
        .ok_or(WindowError::MissingParam("from"))?;
    let to = to
        .filter(|s| !s.trim().is_empty())
        .ok_or(WindowError::MissingParam("to"))?;

    let start = parse_datetime(from, tz).ok_or(WindowError::InvalidDate("from"))?;
    let end = parse_datetime(to, tz).ok_or(WindowError::InvalidDate("to"))?;
    if start > end {
        return Err(WindowError::InvertedRange);
    }
    Ok(TimeWindow { start, end })
}
