//! Rule engine - threshold classification of feature vectors
//!
//! Applies the age-adjusted threshold profile to a feature vector and turns
//! the triggered findings into a scored result: detection flag, confidence,
//! disorder pattern, progression estimate, and human-readable observations.
//!
//! The profile sits behind a `parking_lot::RwLock` so calibration can swap
//! it atomically while classifications run on other threads.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::features::FeatureVector;
use crate::result::{AnalysisResult, ProgressionStage};
use crate::scan::AgeGroup;

use super::thresholds::{Severity, ThresholdProfile};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Adjusted abnormality confidence at or above which a scan is flagged.
pub const DETECTION_THRESHOLD: f64 = 40.0;

/// Confidence reported for a scan with no triggered findings at all.
const CLEAN_SCAN_CONFIDENCE: f64 = 90.0;

/// Temporal darkness ratio above which the Alzheimer's pattern applies.
const ALZHEIMERS_TEMPORAL_MIN: f64 = 1.1;

// ============================================================================
// FINDINGS
// ============================================================================

/// Abnormality categories a finding can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    VentricularEnlargement,
    CorticalAtrophy,
    HemisphericAsymmetry,
    GrayWhiteLoss,
    LesionLoad,
    TemporalAtrophy,
}

impl Category {
    fn describe(&self, severity: Severity) -> String {
        match self {
            Category::VentricularEnlargement => {
                format!("{} ventricular enlargement", severity.label())
            }
            Category::CorticalAtrophy => {
                format!("{} cortical atrophy (widened sulci)", severity.label())
            }
            Category::HemisphericAsymmetry => {
                format!("{} hemispheric asymmetry", severity.label())
            }
            Category::GrayWhiteLoss => {
                format!("{} loss of gray-white differentiation", severity.label())
            }
            Category::LesionLoad => {
                format!("{} white matter lesion load", severity.label())
            }
            Category::TemporalAtrophy => {
                format!("{} temporal lobe atrophy", severity.label())
            }
        }
    }

    fn region(&self) -> &'static str {
        match self {
            Category::VentricularEnlargement => "Lateral ventricles",
            Category::CorticalAtrophy => "Cerebral cortex",
            Category::HemisphericAsymmetry => "Cerebral hemispheres",
            Category::GrayWhiteLoss => "Gray-white matter junction",
            Category::LesionLoad => "Periventricular white matter",
            Category::TemporalAtrophy => "Temporal lobes",
        }
    }
}

/// One triggered abnormality with its graded severity.
#[derive(Debug, Clone, Copy)]
struct Finding {
    category: Category,
    severity: Severity,
}

// ============================================================================
// RULE ENGINE
// ============================================================================

/// Threshold-based classifier over extracted feature vectors.
pub struct RuleEngine {
    profile: RwLock<Arc<ThresholdProfile>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::with_profile(ThresholdProfile::default())
    }

    pub fn with_profile(profile: ThresholdProfile) -> Self {
        Self {
            profile: RwLock::new(Arc::new(profile)),
        }
    }

    /// Snapshot of the active threshold profile.
    pub fn profile(&self) -> Arc<ThresholdProfile> {
        Arc::clone(&self.profile.read())
    }

    /// Atomically replace the active threshold profile.
    pub fn set_profile(&self, profile: ThresholdProfile) {
        *self.profile.write() = Arc::new(profile);
    }

    /// Classify a feature vector against the active profile for the given
    /// age group.
    pub fn classify(&self, features: &FeatureVector, age_group: AgeGroup) -> AnalysisResult {
        let profile = self.profile();
        let rules = profile.for_age_group(age_group);

        let mut findings: Vec<Finding> = Vec::new();
        let mut score = 0.0f64;
        let mut push = |category: Category, severity: Severity, weight: f64| {
            score += severity.weight() * weight;
            findings.push(Finding { category, severity });
        };

        if let Some(sev) = rules.ventricle.tier_for(features.ventricle_ratio) {
            push(Category::VentricularEnlargement, sev, rules.weights.ventricle);
        }
        if let Some(sev) = rules.sulci.tier_for(features.sulci_width) {
            push(Category::CorticalAtrophy, sev, rules.weights.atrophy);
        }
        if let Some(sev) = rules.asymmetry.tier_for(features.asymmetry()) {
            push(Category::HemisphericAsymmetry, sev, rules.weights.symmetry);
        }
        // A zero gray/white ratio means the split could not be measured,
        // not that differentiation is lost
        if features.gray_white_ratio > 0.0 {
            if let Some(sev) = rules.gray_white_loss.tier_for(features.gray_white_loss()) {
                push(Category::GrayWhiteLoss, sev, rules.weights.gray_white);
            }
        }
        if let Some(sev) = rules.lesion.severity_for(features.white_matter_lesion_pct) {
            push(Category::LesionLoad, sev, rules.weights.lesion);
        }
        // Same sentinel convention for the temporal darkness ratio
        if features.temporal_atrophy > 0.0 {
            if let Some(sev) = rules.temporal.severity_for(features.temporal_atrophy) {
                push(Category::TemporalAtrophy, sev, rules.weights.temporal);
            }
        }

        if findings.is_empty() {
            return AnalysisResult {
                detection: false,
                confidence: CLEAN_SCAN_CONFIDENCE,
                observations: vec!["No significant abnormalities detected".to_string()],
                recommendations: vec!["Regular follow-up as needed".to_string()],
                ..AnalysisResult::default()
            };
        }

        let raw_confidence = (score * 100.0).min(100.0);
        let confidence = (raw_confidence * rules.age_multiplier).clamp(0.0, 100.0);
        let detection = confidence >= DETECTION_THRESHOLD;

        let mut observations: Vec<String> = findings
            .iter()
            .map(|f| f.category.describe(f.severity))
            .collect();
        let mut affected_regions: Vec<String> = Vec::new();
        for finding in &findings {
            let region = finding.category.region().to_string();
            if !affected_regions.contains(&region) {
                affected_regions.push(region);
            }
        }

        if !detection {
            observations.push("Findings below diagnostic threshold".to_string());
            log::debug!(
                "classification below threshold: score={:.3} adjusted={:.1}",
                score,
                confidence
            );
            return AnalysisResult {
                detection: false,
                confidence: (100.0 - confidence).clamp(0.0, 100.0),
                observations,
                affected_regions,
                recommendations: vec![
                    "Clinical correlation recommended".to_string(),
                    "Consider follow-up imaging if symptoms present".to_string(),
                ],
                ..AnalysisResult::default()
            };
        }

        let disorder_type = self.match_disorder(&findings, features);
        let progression_pct = findings
            .iter()
            .map(|f| f.severity.progression_score())
            .sum::<f64>()
            / findings.len() as f64;
        let progression_stage = ProgressionStage::from_pct(progression_pct);

        let mut recommendations = vec![
            "Neurological consultation recommended".to_string(),
            "Follow-up MRI in 6 months".to_string(),
        ];
        if disorder_type == "Alzheimer's disease" {
            recommendations.push("Neuropsychological assessment for memory function".to_string());
        }

        log::info!(
            "abnormality detected: {} (confidence {:.1}, progression {:.0}%)",
            disorder_type,
            confidence,
            progression_pct
        );

        AnalysisResult {
            detection: true,
            confidence,
            disorder_type: Some(disorder_type),
            progression_stage: Some(progression_stage),
            progression_pct: Some(progression_pct),
            observations,
            affected_regions,
            recommendations,
        }
    }

    /// Map the finding combination to the best-fitting disorder pattern.
    fn match_disorder(&self, findings: &[Finding], features: &FeatureVector) -> String {
        let has = |category: Category| findings.iter().any(|f| f.category == category);
        let ventricle_at_least_moderate = findings.iter().any(|f| {
            f.category == Category::VentricularEnlargement
                && f.severity.weight() >= Severity::Moderate.weight()
        });

        if has(Category::VentricularEnlargement)
            && (has(Category::CorticalAtrophy) || has(Category::TemporalAtrophy))
            && features.temporal_atrophy > ALZHEIMERS_TEMPORAL_MIN
        {
            "Alzheimer's disease".to_string()
        } else if has(Category::LesionLoad) && has(Category::HemisphericAsymmetry) {
            "Vascular dementia".to_string()
        } else if ventricle_at_least_moderate && !has(Category::CorticalAtrophy) {
            "Normal pressure hydrocephalus".to_string()
        } else {
            "Unspecified neurodegenerative disorder".to_string()
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
