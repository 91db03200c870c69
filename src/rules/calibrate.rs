//! Threshold calibration from labeled cohorts
//!
//! Re-derives the tier bounds of every tier-graded feature from labeled
//! feature vectors: the 95th percentile of the normal cohort becomes the
//! normal ceiling, and the 25th/50th/75th percentiles of the abnormal
//! cohort become the mild/moderate/severe cutoffs. Bounds that come out
//! inverted (overlapping cohorts) are clamped back into tier order before
//! the new profile is installed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::FeatureVector;
use crate::Result;

use super::engine::RuleEngine;
use super::thresholds::{TierBounds, TieredFeature};

// ============================================================================
// PERCENTILES
// ============================================================================

const NORMAL_CEILING_PCT: f64 = 95.0;
const MILD_PCT: f64 = 25.0;
const MODERATE_PCT: f64 = 50.0;
const SEVERE_PCT: f64 = 75.0;

/// Linear-interpolation percentile over a sorted slice. The slice must be
/// non-empty and sorted ascending.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let frac = rank - low as f64;
        sorted[low] * (1.0 - frac) + sorted[high] * frac
    }
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

// ============================================================================
// REPORT
// ============================================================================

/// Per-feature cohort statistics and the bounds derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub feature: TieredFeature,
    pub normal_mean: f64,
    pub normal_std: f64,
    pub abnormal_mean: f64,
    pub abnormal_std: f64,
    pub bounds: TierBounds,
}

/// Outcome of one calibration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub normal_count: usize,
    pub abnormal_count: usize,
    pub stats: Vec<FeatureStats>,
    pub calibrated_at: DateTime<Utc>,
}

// ============================================================================
// CALIBRATION
// ============================================================================

impl RuleEngine {
    /// Re-derive tier bounds from labeled cohorts and install them for all
    /// age groups. The previous profile stays active until the full
    /// replacement is ready.
    pub fn calibrate(
        &self,
        normal: &[FeatureVector],
        abnormal: &[FeatureVector],
    ) -> Result<CalibrationReport> {
        if normal.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "calibration requires at least one normal example".to_string(),
            ));
        }
        if abnormal.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "calibration requires at least one abnormal example".to_string(),
            ));
        }

        let mut profile = (*self.profile()).clone();
        let mut stats = Vec::with_capacity(TieredFeature::ALL.len());

        for feature in TieredFeature::ALL {
            let mut normal_values: Vec<f64> =
                normal.iter().map(|f| feature.axis_value(f)).collect();
            let mut abnormal_values: Vec<f64> =
                abnormal.iter().map(|f| feature.axis_value(f)).collect();
            normal_values.sort_by(|a, b| a.total_cmp(b));
            abnormal_values.sort_by(|a, b| a.total_cmp(b));

            let bounds = TierBounds::new(
                percentile(&normal_values, NORMAL_CEILING_PCT),
                percentile(&abnormal_values, MILD_PCT),
                percentile(&abnormal_values, MODERATE_PCT),
                percentile(&abnormal_values, SEVERE_PCT),
            )
            .clamped();

            for group in [
                &mut profile.child,
                &mut profile.adult,
                &mut profile.elderly,
            ] {
                match feature {
                    TieredFeature::VentricleRatio => group.ventricle = bounds,
                    TieredFeature::SulciWidth => group.sulci = bounds,
                    TieredFeature::Asymmetry => group.asymmetry = bounds,
                    TieredFeature::GrayWhiteLoss => group.gray_white_loss = bounds,
                }
            }

            let (normal_mean, normal_std) = mean_and_std(&normal_values);
            let (abnormal_mean, abnormal_std) = mean_and_std(&abnormal_values);
            stats.push(FeatureStats {
                feature,
                normal_mean,
                normal_std,
                abnormal_mean,
                abnormal_std,
                bounds,
            });
        }

        self.set_profile(profile);

        let report = CalibrationReport {
            normal_count: normal.len(),
            abnormal_count: abnormal.len(),
            stats,
            calibrated_at: Utc::now(),
        };
        log::info!(
            "thresholds calibrated from {} normal / {} abnormal examples",
            report.normal_count,
            report.abnormal_count
        );
        Ok(report)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::AgeGroup;

    fn vector_with_ventricle(ratio: f64) -> FeatureVector {
        let mut f = FeatureVector::zeroed();
        f.ventricle_ratio = ratio;
        f.symmetry_score = 1.0;
        f
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert_eq!(percentile(&values, 50.0), 2.5);
        assert_eq!(percentile(&values, 25.0), 1.75);
    }

    #[test]
    fn test_percentile_single_value() {
        assert_eq!(percentile(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn test_empty_cohort_is_rejected() {
        let engine = RuleEngine::new();
        let err = engine
            .calibrate(&[], &[vector_with_ventricle(15.0)])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
        let err = engine
            .calibrate(&[vector_with_ventricle(3.0)], &[])
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_calibration_moves_bounds_and_keeps_ordering() {
        let engine = RuleEngine::new();
        let normal: Vec<_> = [1.0, 2.0, 2.5, 3.0, 3.5]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        let abnormal: Vec<_> = [10.0, 14.0, 18.0, 22.0]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        let report = engine.calibrate(&normal, &abnormal).unwrap();
        assert_eq!(report.normal_count, 5);
        assert_eq!(report.abnormal_count, 4);

        let profile = engine.profile();
        assert!(profile.is_ordered());
        let bounds = &profile.adult.ventricle;
        // p95 of normals, p25/p50/p75 of abnormals
        assert!((bounds.normal_max - 3.4).abs() < 1e-9);
        assert!((bounds.mild_max - 13.0).abs() < 1e-9);
        assert!((bounds.moderate_max - 16.0).abs() < 1e-9);
        assert!((bounds.severe_min - 19.0).abs() < 1e-9);
        // All age groups get identical calibrated bounds
        assert_eq!(profile.child.ventricle, profile.elderly.ventricle);
    }

    #[test]
    fn test_overlapping_cohorts_are_clamped() {
        let engine = RuleEngine::new();
        // Normal cohort sits above the abnormal one; raw bounds invert
        let normal: Vec<_> = [20.0, 21.0, 22.0]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        let abnormal: Vec<_> = [5.0, 6.0, 7.0]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        engine.calibrate(&normal, &abnormal).unwrap();
        assert!(engine.profile().is_ordered());
    }

    #[test]
    fn test_calibration_is_deterministic() {
        let normal: Vec<_> = [1.0, 2.0, 3.0]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        let abnormal: Vec<_> = [10.0, 12.0, 14.0]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        let a = RuleEngine::new();
        let b = RuleEngine::new();
        a.calibrate(&normal, &abnormal).unwrap();
        b.calibrate(&normal, &abnormal).unwrap();
        assert_eq!(*a.profile(), *b.profile());
    }

    #[test]
    fn test_calibrated_engine_reclassifies() {
        let engine = RuleEngine::new();
        let scan = vector_with_ventricle(6.0);
        assert!(!engine.classify(&scan, AgeGroup::Adult).detection);

        let normal: Vec<_> = [1.0, 1.5, 2.0]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        let abnormal: Vec<_> = [3.0, 4.0, 5.0]
            .iter()
            .map(|&r| vector_with_ventricle(r))
            .collect();
        engine.calibrate(&normal, &abnormal).unwrap();
        // 6.0 now clears the calibrated severe cutoff
        let result = engine.classify(&scan, AgeGroup::Adult);
        assert!(result.detection);
    }
}
