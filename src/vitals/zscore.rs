//! Z-score annotation of a window of readings.
//!
//! The population is exactly the slice passed in. Standard deviation is the
//! population form (divide by N). When it is zero (N <= 1, or every value
//! identical) the z-score is defined as 0.

use serde::Serialize;

use crate::models::Reading;

/// |z| at or above this marks a reading as anomalous within its window.
pub const ANOMALY_Z_THRESHOLD: f64 = 2.0;

/// Mean and population standard deviation of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { mean: 0.0, std_dev: 0.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    pub fn z_score(&self, value: f64) -> f64 {
        // Exact comparison: only a truly constant series has zero spread.
        if self.std_dev == 0.0 {
            return 0.0;
        }
        (value - self.mean) / self.std_dev
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    pub count: usize,
    pub systolic: MetricStats,
    pub diastolic: MetricStats,
    pub pulse: MetricStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZScores {
    pub systolic: f64,
    pub diastolic: f64,
    pub pulse: f64,
}

impl ZScores {
    fn is_anomalous(&self) -> bool {
        [self.systolic, self.diastolic, self.pulse]
            .iter()
            .any(|z| z.abs() >= ANOMALY_Z_THRESHOLD)
    }
}

/// A reading with its deviation scores relative to the query window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredReading {
    #[serde(flatten)]
    pub reading: Reading,
    pub z_score: ZScores,
    pub anomaly: bool,
}

fn metric_stats(readings: &[Reading], value: impl Fn(&Reading) -> i32) -> MetricStats {
    let values: Vec<f64> = readings.iter().map(|r| f64::from(value(r))).collect();
    MetricStats::from_values(&values)
}

/// Per-metric mean and spread of a window.
pub fn summarize(readings: &[Reading]) -> WindowStats {
    WindowStats {
        count: readings.len(),
        systolic: metric_stats(readings, |r| r.systolic),
        diastolic: metric_stats(readings, |r| r.diastolic),
        pulse: metric_stats(readings, |r| r.pulse),
    }
}

/// Attach per-metric z-scores to every reading, preserving input order.
pub fn annotate(readings: &[Reading]) -> Vec<ScoredReading> {
    let stats = summarize(readings);
    readings
        .iter()
        .map(|r| {
            let z_score = ZScores {
                systolic: stats.systolic.z_score(f64::from(r.systolic)),
                diastolic: stats.diastolic.z_score(f64::from(r.diastolic)),
                pulse: stats.pulse.z_score(f64::from(r.pulse)),
            };
            ScoredReading {
                reading: r.clone(),
                anomaly: z_score.is_anomalous(),
                z_score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BpStatus, PulseStatus};

    fn reading(id: i64, systolic: i32, diastolic: i32, pulse: i32) -> Reading {
        Reading {
            id,
            user_id: 1,
            systolic,
            diastolic,
            pulse,
            bp_status: BpStatus::Normal,
            pulse_status: PulseStatus::Normal,
            clinical_bp_label: String::new(),
            timestamp: format!("t{id}"),
            recorded_at: format!("2024-03-15T00:00:{id:02}.000Z"),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_window_yields_empty_output() {
        assert!(annotate(&[]).is_empty());
        assert_eq!(summarize(&[]).count, 0);
    }

    #[test]
    fn single_reading_scores_zero() {
        let out = annotate(&[reading(1, 140, 90, 80)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].z_score, ZScores { systolic: 0.0, diastolic: 0.0, pulse: 0.0 });
        assert!(!out[0].anomaly);
    }

    #[test]
    fn identical_metric_scores_zero_for_that_metric_only() {
        let out = annotate(&[
            reading(1, 120, 80, 60),
            reading(2, 120, 80, 70),
            reading(3, 120, 80, 80),
        ]);
        for r in &out {
            assert_eq!(r.z_score.systolic, 0.0);
            assert_eq!(r.z_score.diastolic, 0.0);
        }
        // pulse mean 70, population sd sqrt(200/3)
        let sd = (200.0f64 / 3.0).sqrt();
        assert!(close(out[0].z_score.pulse, -10.0 / sd));
        assert!(close(out[1].z_score.pulse, 0.0));
        assert!(close(out[2].z_score.pulse, 10.0 / sd));
    }

    #[test]
    fn known_population_statistics() {
        // 2, 4, 4, 4, 5, 5, 7, 9: mean 5, population sd 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = MetricStats::from_values(&values);
        assert!(close(stats.mean, 5.0));
        assert!(close(stats.std_dev, 2.0));
        assert!(close(stats.z_score(9.0), 2.0));
        assert!(close(stats.z_score(2.0), -1.5));
    }

    #[test]
    fn output_preserves_input_order() {
        let input = [reading(3, 150, 95, 90), reading(1, 110, 70, 60), reading(2, 130, 85, 75)];
        let out = annotate(&input);
        let ids: Vec<i64> = out.iter().map(|r| r.reading.id).collect();
        assert_eq!(ids, [3, 1, 2]);
    }

    #[test]
    fn outlier_is_flagged() {
        let mut input: Vec<Reading> = (1..=9).map(|i| reading(i, 120, 80, 70)).collect();
        input.push(reading(10, 200, 80, 70));
        let out = annotate(&input);
        // 9 x 120 and one 200: mean 128, sd 24, z = 72 / 24 = 3
        assert!(close(out[9].z_score.systolic, 3.0));
        assert!(out[9].anomaly);
        assert!(!out[0].anomaly);
    }

    #[test]
    fn serializes_flat_with_z_scores() {
        let out = annotate(&[reading(1, 120, 80, 70)]);
        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["systolic"], 120);
        assert_eq!(json["bpStatus"], "Normal");
        assert_eq!(json["zScore"]["pulse"], 0.0);
        assert_eq!(json["anomaly"], false);
    }
}
