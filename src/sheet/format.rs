//! Positional CSV layouts published by the reading spreadsheet.
//!
//! Every layout is `date, time-or-datetime, systolic, diastolic, pulse`.
//! Only the first line is read; the sheet publishes the latest reading.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;

use super::{SheetError, SheetReading};
use crate::vitals::window::format_utc;

static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}:\d{2}").unwrap());

/// Column layout of the published sheet. Selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetLayout {
    /// v2: `dd/mm/yyyy,HH:MM:SS,sys,dia,pulse`
    #[default]
    Split,
    /// v1: `dd/mm/yyyy,<text containing HH:MM:SS>,sys,dia,pulse`
    Legacy,
    /// `<ignored>,<RFC 3339>,sys,dia,pulse`
    Iso,
}

impl SheetLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Legacy => "legacy",
            Self::Iso => "iso",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "split" | "v2" => Some(Self::Split),
            "legacy" | "v1" => Some(Self::Legacy),
            "iso" => Some(Self::Iso),
            _ => None,
        }
    }
}

/// Parse the published text into the latest reading.
///
/// Day-first dates are read at `offset` and normalised to UTC.
pub fn parse_sheet_text(
    text: &str,
    layout: SheetLayout,
    offset: FixedOffset,
) -> Result<SheetReading, SheetError> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| SheetError::Malformed("empty sheet".into()))?;

    let fields: Vec<&str> = line.split(',').map(|f| f.trim().trim_matches('"')).collect();
    if fields.len() < 5 {
        return Err(SheetError::Malformed(format!(
            "expected 5 fields, found {}",
            fields.len()
        )));
    }

    let instant = match layout {
        SheetLayout::Split => day_first(fields[0], fields[1], offset)?,
        SheetLayout::Legacy => {
            let time = CLOCK_TIME
                .find(fields[1])
                .ok_or_else(|| SheetError::Malformed(format!("no time in {:?}", fields[1])))?;
            day_first(fields[0], time.as_str(), offset)?
        }
        SheetLayout::Iso => DateTime::parse_from_rfc3339(fields[1])
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| SheetError::Malformed(format!("datetime {:?}: {e}", fields[1])))?,
    };

    Ok(SheetReading {
        timestamp: format_utc(&instant),
        systolic: number(fields[2], "systolic")?,
        diastolic: number(fields[3], "diastolic")?,
        pulse: number(fields[4], "pulse")?,
    })
}

fn day_first(date: &str, time: &str, offset: FixedOffset) -> Result<DateTime<Utc>, SheetError> {
    let date = NaiveDate::parse_from_str(date, "%d/%m/%Y")
        .map_err(|e| SheetError::Malformed(format!("date {date:?}: {e}")))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .map_err(|e| SheetError::Malformed(format!("time {time:?}: {e}")))?;
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| SheetError::Malformed("unrepresentable local time".into()))
}

fn number(value: &str, field: &str) -> Result<i32, SheetError> {
    value
        .parse()
        .map_err(|_| SheetError::Malformed(format!("{field} is not a number: {value:?}")))
}
