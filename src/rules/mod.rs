//! Rules module - threshold profiles, classification, calibration
//!
//! The rule engine scores feature vectors against age-adjusted tier
//! thresholds; the calibrator re-derives those thresholds from labeled
//! cohorts at runtime.

pub mod calibrate;
pub mod engine;
pub mod thresholds;

// Re-export common items
pub use calibrate::{CalibrationReport, FeatureStats};
pub use engine::{RuleEngine, DETECTION_THRESHOLD};
pub use thresholds::{
    AgeThresholds, BinaryCutoffs, CategoryWeights, Severity, ThresholdProfile, TierBounds,
    TieredFeature,
};
