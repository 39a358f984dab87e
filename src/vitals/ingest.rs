//! Reading ingestion: validate → classify → claim → alert.
//!
//! Side effects per call: at most one reading row, at most one email, at
//! most one alert row. The reading row is claimed before the alert branch
//! runs, so an alert row always has a matching reading and a duplicate
//! submission never reaches the mailer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;

use super::classifier::ClinicalClassifier;
use super::policy::AlertPolicy;
use super::window::{format_utc, parse_datetime};
use crate::db::{self, DatabaseError};
use crate::models::{AuthUser, Classification, NewAlert, NewReading};
use crate::notify::AlertMailer;

/// Accepted range for systolic, diastolic and pulse.
pub const VALUE_RANGE: std::ops::RangeInclusive<i32> = 1..=300;

const MAX_TIMESTAMP_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),

    #[error("Reading could not be classified (age {age})")]
    Unclassifiable { age: i32 },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Measurement time as submitted: an ISO string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubmittedTimestamp {
    Text(String),
    EpochMillis(i64),
}

impl SubmittedTimestamp {
    /// The dedup key stored verbatim.
    pub fn as_key(&self) -> String {
        match self {
            SubmittedTimestamp::Text(s) => s.clone(),
            SubmittedTimestamp::EpochMillis(ms) => ms.to_string(),
        }
    }

    fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            SubmittedTimestamp::Text(s) => parse_datetime(s, &Utc),
            SubmittedTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
        }
    }
}

/// Inbound reading payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingSubmission {
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub timestamp: SubmittedTimestamp,
}

impl ReadingSubmission {
    /// Check value bounds and resolve the timestamp to its UTC sort key.
    fn validate(&self) -> Result<String, IngestError> {
        for (name, value) in [
            ("systolic", self.systolic),
            ("diastolic", self.diastolic),
            ("pulse", self.pulse),
        ] {
            if !VALUE_RANGE.contains(&value) {
                return Err(IngestError::Validation(format!(
                    "{name} must be between {} and {}",
                    VALUE_RANGE.start(),
                    VALUE_RANGE.end()
                )));
            }
        }

        let key = self.timestamp.as_key();
        if key.trim().is_empty() || key.len() > MAX_TIMESTAMP_LEN {
            return Err(IngestError::Validation("timestamp is required".into()));
        }
        let instant = self
            .timestamp
            .instant()
            .ok_or_else(|| IngestError::Validation(format!("Invalid timestamp: {key}")))?;
        Ok(format_utc(&instant))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Reading was within the alert policy.
    NotRequired,
    /// Email accepted and alert row written.
    Recorded { alert_id: i64 },
    /// Email failed; reading kept, no alert row.
    DeliveryFailed,
    /// Email sent but the alert row could not be written; reading kept.
    Unrecorded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Saved { reading_id: i64, alert: AlertOutcome },
    /// A reading with this timestamp already exists for the user.
    Duplicate,
}

/// Email body sent for an abnormal reading.
pub fn alert_email_text(classification: &Classification) -> String {
    format!(
        "Blood Pressure: {}. Consider going to the nearest clinic.",
        classification.clinical_bp_label
    )
}

/// Alert history message for an abnormal reading.
pub fn alert_record_message(classification: &Classification) -> String {
    format!(
        "Bp: {} Pulse: {}",
        classification.clinical_bp_label,
        classification.pulse_status.as_str()
    )
}

pub struct IngestionWorkflow {
    classifier: ClinicalClassifier,
    policy: AlertPolicy,
    mailer: Arc<dyn AlertMailer>,
}

impl IngestionWorkflow {
    pub fn new(
        classifier: ClinicalClassifier,
        policy: AlertPolicy,
        mailer: Arc<dyn AlertMailer>,
    ) -> Self {
        Self {
            classifier,
            policy,
            mailer,
        }
    }

    /// Ingest one reading for `user`. Blocking: runs SQL and may send email.
    pub fn submit(
        &self,
        conn: &Connection,
        user: &AuthUser,
        submission: &ReadingSubmission,
    ) -> Result<IngestOutcome, IngestError> {
        let recorded_at = submission.validate()?;

        let classification = self
            .classifier
            .classify(submission.systolic, submission.diastolic, submission.pulse, user.age)
            .ok_or(IngestError::Unclassifiable { age: user.age })?;

        let timestamp = submission.timestamp.as_key();
        if db::find_reading_by_timestamp(conn, user.id, &timestamp)?.is_some() {
            tracing::debug!(user_id = user.id, %timestamp, "Duplicate reading skipped");
            return Ok(IngestOutcome::Duplicate);
        }

        let new_reading = NewReading {
            user_id: user.id,
            systolic: submission.systolic,
            diastolic: submission.diastolic,
            pulse: submission.pulse,
            classification: classification.clone(),
            timestamp,
            recorded_at,
        };
        // A concurrent submission may have landed since the lookup.
        let Some(reading_id) = db::insert_reading_if_absent(conn, &new_reading)? else {
            tracing::debug!(user_id = user.id, "Duplicate reading lost insert race");
            return Ok(IngestOutcome::Duplicate);
        };

        let alert = if self.policy.is_abnormal(&classification) {
            self.dispatch_alert(conn, user, &classification)
        } else {
            AlertOutcome::NotRequired
        };

        tracing::info!(
            user_id = user.id,
            reading_id,
            bp_status = classification.bp_status.as_str(),
            pulse_status = classification.pulse_status.as_str(),
            ?alert,
            "Reading saved"
        );
        Ok(IngestOutcome::Saved { reading_id, alert })
    }

    fn dispatch_alert(
        &self,
        conn: &Connection,
        user: &AuthUser,
        classification: &Classification,
    ) -> AlertOutcome {
        if let Err(e) = self.mailer.send(&user.email, &alert_email_text(classification)) {
            tracing::warn!(user_id = user.id, error = %e, "Alert email failed; no alert recorded");
            return AlertOutcome::DeliveryFailed;
        }

        let alert = NewAlert {
            user_id: user.id,
            message: alert_record_message(classification),
            timestamp: format_utc(&Utc::now()),
        };
        // The reading is already committed; a retry would only see a duplicate.
        match db::insert_alert(conn, &alert) {
            Ok(alert_id) => AlertOutcome::Recorded { alert_id },
            Err(e) => {
                tracing::error!(user_id = user.id, error = %e, "Alert sent but not recorded");
                AlertOutcome::Unrecorded
            }
        }
    }
}
