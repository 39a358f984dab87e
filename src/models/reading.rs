use serde::{Deserialize, Serialize};

/// Blood pressure band assigned by the clinical classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BpStatus {
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Elevated")]
    Elevated,
    #[serde(rename = "Hypertension Stage 1")]
    HypertensionStage1,
    #[serde(rename = "Hypertension Stage 2")]
    HypertensionStage2,
    #[serde(rename = "Hypertensive Crisis")]
    HypertensiveCrisis,
    /// Pediatric brackets report hypotension with the short label.
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Low BP (Hypotension)")]
    Hypotension,
}

impl BpStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BpStatus::Normal => "Normal",
            BpStatus::Elevated => "Elevated",
            BpStatus::HypertensionStage1 => "Hypertension Stage 1",
            BpStatus::HypertensionStage2 => "Hypertension Stage 2",
            BpStatus::HypertensiveCrisis => "Hypertensive Crisis",
            BpStatus::Low => "Low",
            BpStatus::Hypotension => "Low BP (Hypotension)",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Normal" => Some(BpStatus::Normal),
            "Elevated" => Some(BpStatus::Elevated),
            "Hypertension Stage 1" => Some(BpStatus::HypertensionStage1),
            "Hypertension Stage 2" => Some(BpStatus::HypertensionStage2),
            "Hypertensive Crisis" => Some(BpStatus::HypertensiveCrisis),
            "Low" => Some(BpStatus::Low),
            "Low BP (Hypotension)" => Some(BpStatus::Hypotension),
            _ => None,
        }
    }
}

/// Pulse band assigned by the clinical classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PulseStatus {
    Normal,
    High,
    Low,
}

impl PulseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PulseStatus::Normal => "Normal",
            PulseStatus::High => "High",
            PulseStatus::Low => "Low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Normal" => Some(PulseStatus::Normal),
            "High" => Some(PulseStatus::High),
            "Low" => Some(PulseStatus::Low),
            _ => None,
        }
    }
}

/// Classifier output threaded through ingestion. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub bp_status: BpStatus,
    pub pulse_status: PulseStatus,
    pub clinical_bp_label: String,
}

/// A stored blood pressure / pulse measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub id: i64,
    pub user_id: i64,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub bp_status: BpStatus,
    pub pulse_status: PulseStatus,
    pub clinical_bp_label: String,
    /// Measurement time exactly as submitted (dedup key).
    pub timestamp: String,
    /// `timestamp` normalised to UTC, `%Y-%m-%dT%H:%M:%S%.3fZ` (sort/filter key).
    pub recorded_at: String,
}

/// Row to insert, before the database assigns an id.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub user_id: i64,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub classification: Classification,
    pub timestamp: String,
    pub recorded_at: String,
}
