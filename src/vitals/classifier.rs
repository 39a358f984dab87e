//! Age-aware clinical classification of a blood pressure / pulse reading.
//!
//! Thresholds are data: one [`AgeBracket`] per supported age range, each
//! holding an ordered list of BP bands (first match wins) and a pulse band.
//! Adult and adolescent bands follow the 2017 ACC/AHA categories; the
//! pediatric bands approximate the 50th/90th/95th percentile cut-offs
//! for average-height children.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use crate::models::{BpStatus, Classification, PulseStatus};

/// How a band's systolic and diastolic ranges combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandMatch {
    /// Either value inside its range is enough (hypertension, hypotension).
    Either,
    /// Both values must be inside their ranges (normal, elevated).
    Both,
}

/// One row of a BP threshold table.
#[derive(Debug, Clone)]
pub struct BpBand {
    pub status: BpStatus,
    pub systolic: RangeInclusive<i32>,
    pub diastolic: RangeInclusive<i32>,
    pub mode: BandMatch,
    /// Human-readable descriptor used in `clinical_bp_label`.
    pub descriptor: &'static str,
}

impl BpBand {
    fn matches(&self, systolic: i32, diastolic: i32) -> bool {
        let sys = self.systolic.contains(&systolic);
        let dia = self.diastolic.contains(&diastolic);
        match self.mode {
            BandMatch::Either => sys || dia,
            BandMatch::Both => sys && dia,
        }
    }
}

/// Thresholds for one age range.
#[derive(Debug, Clone)]
pub struct AgeBracket {
    pub ages: RangeInclusive<i32>,
    pub bp_bands: Vec<BpBand>,
    /// Resting pulse considered normal, bpm.
    pub pulse_normal: RangeInclusive<i32>,
}

/// Upper bound used for open-ended bands.
const MAX_VALUE: i32 = 300;

fn band(
    status: BpStatus,
    systolic: RangeInclusive<i32>,
    diastolic: RangeInclusive<i32>,
    mode: BandMatch,
    descriptor: &'static str,
) -> BpBand {
    BpBand { status, systolic, diastolic, mode, descriptor }
}

/// Ordered threshold table for all supported ages.
///
/// Within a bracket the low band comes first, then the hypertension bands
/// from most to least severe, then elevated and normal. With that order
/// every positive (systolic, diastolic) pair up to 300 lands on exactly one
/// band.
pub fn threshold_table() -> Vec<AgeBracket> {
    use BandMatch::{Both, Either};
    use BpStatus::*;

    vec![
        AgeBracket {
            ages: 1..=5,
            bp_bands: vec![
                band(Low, 1..=79, 1..=44, Either, "Low Blood Pressure"),
                band(HypertensionStage2, 120..=MAX_VALUE, 80..=MAX_VALUE, Either, "Stage 2 Hypertension"),
                band(HypertensionStage1, 110..=119, 70..=79, Either, "Stage 1 Hypertension"),
                band(Elevated, 105..=109, 45..=69, Both, "Elevated Blood Pressure"),
                band(Elevated, 80..=109, 65..=69, Both, "Elevated Blood Pressure"),
                band(Normal, 80..=104, 45..=64, Both, "Normal Blood Pressure"),
            ],
            pulse_normal: 80..=130,
        },
        AgeBracket {
            ages: 6..=12,
            bp_bands: vec![
                band(Low, 1..=89, 1..=54, Either, "Low Blood Pressure"),
                band(HypertensionStage2, 130..=MAX_VALUE, 85..=MAX_VALUE, Either, "Stage 2 Hypertension"),
                band(HypertensionStage1, 120..=129, 80..=84, Either, "Stage 1 Hypertension"),
                band(Elevated, 115..=119, 55..=79, Both, "Elevated Blood Pressure"),
                band(Elevated, 90..=119, 75..=79, Both, "Elevated Blood Pressure"),
                band(Normal, 90..=114, 55..=74, Both, "Normal Blood Pressure"),
            ],
            pulse_normal: 70..=120,
        },
        AgeBracket {
            ages: 13..=17,
            bp_bands: vec![
                band(Low, 1..=89, 1..=59, Either, "Low Blood Pressure"),
                band(HypertensiveCrisis, 181..=MAX_VALUE, 121..=MAX_VALUE, Either, "Hypertensive Crisis"),
                band(HypertensionStage2, 140..=180, 90..=120, Either, "Stage 2 Hypertension"),
                band(HypertensionStage1, 130..=139, 80..=89, Either, "Stage 1 Hypertension"),
                band(Elevated, 120..=129, 60..=79, Both, "Elevated Blood Pressure"),
                band(Normal, 90..=119, 60..=79, Both, "Normal Blood Pressure"),
            ],
            pulse_normal: 60..=100,
        },
        AgeBracket {
            ages: 18..=120,
            bp_bands: vec![
                band(Hypotension, 1..=89, 1..=59, Either, "Hypotension"),
                band(HypertensiveCrisis, 181..=MAX_VALUE, 121..=MAX_VALUE, Either, "Hypertensive Crisis"),
                band(HypertensionStage2, 140..=180, 90..=120, Either, "Stage 2 Hypertension"),
                band(HypertensionStage1, 130..=139, 80..=89, Either, "Stage 1 Hypertension"),
                band(Elevated, 120..=129, 60..=79, Both, "Elevated Blood Pressure"),
                band(Normal, 90..=119, 60..=79, Both, "Normal Blood Pressure"),
            ],
            pulse_normal: 60..=100,
        },
    ]
}

/// Table-driven classifier. Build once and share.
#[derive(Debug, Clone)]
pub struct ClinicalClassifier {
    brackets: Vec<AgeBracket>,
}

impl Default for ClinicalClassifier {
    fn default() -> Self {
        Self::new(threshold_table())
    }
}

impl ClinicalClassifier {
    pub fn new(brackets: Vec<AgeBracket>) -> Self {
        Self { brackets }
    }

    fn bracket_for(&self, age: i32) -> Option<&AgeBracket> {
        self.brackets.iter().find(|b| b.ages.contains(&age))
    }

    /// Classify a reading. `None` when the age has no bracket or a value
    /// falls outside every band (zero, negative, above 300).
    pub fn classify(
        &self,
        systolic: i32,
        diastolic: i32,
        pulse: i32,
        age: i32,
    ) -> Option<Classification> {
        let plausible = 1..=MAX_VALUE;
        if ![systolic, diastolic, pulse].iter().all(|v| plausible.contains(v)) {
            return None;
        }
        let bracket = self.bracket_for(age)?;
        let band = bracket
            .bp_bands
            .iter()
            .find(|b| b.matches(systolic, diastolic))?;

        let pulse_status = if pulse < *bracket.pulse_normal.start() {
            PulseStatus::Low
        } else if pulse > *bracket.pulse_normal.end() {
            PulseStatus::High
        } else {
            PulseStatus::Normal
        };

        Some(Classification {
            bp_status: band.status,
            pulse_status,
            clinical_bp_label: format!("{} ({systolic}/{diastolic} mmHg)", band.descriptor),
        })
    }
}

static BUILTIN: LazyLock<ClinicalClassifier> = LazyLock::new(ClinicalClassifier::default);

/// Shared classifier over the built-in threshold table.
pub fn builtin() -> &'static ClinicalClassifier {
    &BUILTIN
}

/// Classify with the built-in threshold table.
pub fn classify(systolic: i32, diastolic: i32, pulse: i32, age: i32) -> Option<Classification> {
    builtin().classify(systolic, diastolic, pulse, age)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: i32, d: i32, age: i32) -> BpStatus {
        classify(s, d, 72, age).unwrap().bp_status
    }

    #[test]
    fn adult_categories() {
        assert_eq!(status(115, 75, 40), BpStatus::Normal);
        assert_eq!(status(125, 75, 40), BpStatus::Elevated);
        assert_eq!(status(135, 75, 40), BpStatus::HypertensionStage1);
        assert_eq!(status(118, 85, 40), BpStatus::HypertensionStage1);
        assert_eq!(status(150, 85, 40), BpStatus::HypertensionStage2);
        assert_eq!(status(125, 95, 40), BpStatus::HypertensionStage2);
        assert_eq!(status(190, 120, 40), BpStatus::HypertensiveCrisis);
        assert_eq!(status(170, 125, 40), BpStatus::HypertensiveCrisis);
        assert_eq!(status(85, 70, 40), BpStatus::Hypotension);
        assert_eq!(status(110, 55, 40), BpStatus::Hypotension);
    }

    #[test]
    fn adult_band_edges() {
        assert_eq!(status(119, 79, 30), BpStatus::Normal);
        assert_eq!(status(120, 79, 30), BpStatus::Elevated);
        assert_eq!(status(129, 79, 30), BpStatus::Elevated);
        assert_eq!(status(130, 60, 30), BpStatus::HypertensionStage1);
        assert_eq!(status(140, 60, 30), BpStatus::HypertensionStage2);
        assert_eq!(status(180, 60, 30), BpStatus::HypertensionStage2);
        assert_eq!(status(181, 60, 30), BpStatus::HypertensiveCrisis);
        assert_eq!(status(90, 60, 30), BpStatus::Normal);
    }

    #[test]
    fn builtin_table_is_built_once() {
        assert!(std::ptr::eq(builtin(), builtin()));
        assert_eq!(
            builtin().classify(118, 76, 70, 40),
            ClinicalClassifier::default().classify(118, 76, 70, 40)
        );
    }

    #[test]
    fn crisis_reading_label() {
        let c = classify(190, 120, 60, 40).unwrap();
        assert_eq!(c.bp_status, BpStatus::HypertensiveCrisis);
        assert_eq!(c.pulse_status, PulseStatus::Normal);
        assert_eq!(c.clinical_bp_label, "Hypertensive Crisis (190/120 mmHg)");
    }

    #[test]
    fn pediatric_uses_short_low_label() {
        assert_eq!(status(75, 50, 4), BpStatus::Low);
        assert_eq!(status(85, 50, 9), BpStatus::Low);
        assert_eq!(status(85, 70, 15), BpStatus::Low);
    }

    #[test]
    fn child_thresholds_are_lower_than_adult() {
        // 125/82 is stage 1 for an adult but stage 2 for a preschooler
        assert_eq!(status(125, 82, 40), BpStatus::HypertensionStage1);
        assert_eq!(status(125, 82, 4), BpStatus::HypertensionStage2);
        assert_eq!(status(100, 60, 4), BpStatus::Normal);
        assert_eq!(status(107, 60, 4), BpStatus::Elevated);
        assert_eq!(status(112, 60, 8), BpStatus::Normal);
        assert_eq!(status(117, 60, 8), BpStatus::Elevated);
        assert_eq!(status(122, 60, 8), BpStatus::HypertensionStage1);
    }

    #[test]
    fn pulse_bands_follow_age() {
        assert_eq!(classify(115, 75, 55, 40).unwrap().pulse_status, PulseStatus::Low);
        assert_eq!(classify(115, 75, 105, 40).unwrap().pulse_status, PulseStatus::High);
        assert_eq!(classify(115, 75, 60, 40).unwrap().pulse_status, PulseStatus::Normal);
        assert_eq!(classify(115, 75, 100, 40).unwrap().pulse_status, PulseStatus::Normal);
        // 110 bpm is normal for a 4-year-old
        assert_eq!(classify(100, 60, 110, 4).unwrap().pulse_status, PulseStatus::Normal);
        assert_eq!(classify(100, 60, 75, 4).unwrap().pulse_status, PulseStatus::Low);
    }

    #[test]
    fn unsupported_age_is_unclassifiable() {
        assert!(classify(120, 80, 70, 0).is_none());
        assert!(classify(120, 80, 70, -3).is_none());
        assert!(classify(120, 80, 70, 121).is_none());
    }

    #[test]
    fn out_of_range_values_are_unclassifiable() {
        assert!(classify(0, 80, 70, 40).is_none());
        assert!(classify(120, -1, 70, 40).is_none());
        assert!(classify(120, 80, 0, 40).is_none());
        assert!(classify(120, 80, 301, 40).is_none());
    }

    #[test]
    fn every_supported_input_classifies_deterministically() {
        let classifier = ClinicalClassifier::default();
        for age in [1, 5, 6, 12, 13, 17, 18, 64, 120] {
            for s in (1..=300).step_by(7) {
                for d in (1..=300).step_by(11) {
                    let first = classifier.classify(s, d, 72, age);
                    assert!(first.is_some(), "no band for {s}/{d} at age {age}");
                    assert_eq!(first, classifier.classify(s, d, 72, age));
                }
            }
        }
    }

    #[test]
    fn custom_table_replaces_thresholds() {
        let classifier = ClinicalClassifier::new(vec![AgeBracket {
            ages: 18..=120,
            bp_bands: vec![band(
                BpStatus::Normal,
                1..=MAX_VALUE,
                1..=MAX_VALUE,
                BandMatch::Both,
                "Any",
            )],
            pulse_normal: 1..=300,
        }]);
        let c = classifier.classify(250, 150, 200, 30).unwrap();
        assert_eq!(c.bp_status, BpStatus::Normal);
        assert_eq!(c.clinical_bp_label, "Any (250/150 mmHg)");
        assert!(classifier.classify(120, 80, 70, 10).is_none());
    }
}
