use std::collections::HashSet;

use crate::models::{BpStatus, Classification, PulseStatus};

/// Which classifications count as abnormal and trigger an alert.
///
/// Independent of the classifier's thresholds: changing what gets alerted
/// never touches the bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPolicy {
    bp_statuses: HashSet<BpStatus>,
    pulse_statuses: HashSet<PulseStatus>,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(
            [
                BpStatus::HypertensiveCrisis,
                BpStatus::HypertensionStage2,
                BpStatus::HypertensionStage1,
                BpStatus::Elevated,
                BpStatus::Low,
                BpStatus::Hypotension,
            ],
            [PulseStatus::High, PulseStatus::Low],
        )
    }
}

impl AlertPolicy {
    pub fn new(
        bp_statuses: impl IntoIterator<Item = BpStatus>,
        pulse_statuses: impl IntoIterator<Item = PulseStatus>,
    ) -> Self {
        Self {
            bp_statuses: bp_statuses.into_iter().collect(),
            pulse_statuses: pulse_statuses.into_iter().collect(),
        }
    }

    pub fn with_bp_status(mut self, status: BpStatus) -> Self {
        self.bp_statuses.insert(status);
        self
    }

    pub fn with_pulse_status(mut self, status: PulseStatus) -> Self {
        self.pulse_statuses.insert(status);
        self
    }

    pub fn bp_statuses(&self) -> impl Iterator<Item = &BpStatus> {
        self.bp_statuses.iter()
    }

    pub fn pulse_statuses(&self) -> impl Iterator<Item = &PulseStatus> {
        self.pulse_statuses.iter()
    }

    pub fn is_abnormal(&self, classification: &Classification) -> bool {
        self.bp_statuses.contains(&classification.bp_status)
            || self.pulse_statuses.contains(&classification.pulse_status)
    }
}
