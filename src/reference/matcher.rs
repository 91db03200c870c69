//! Reference matcher - nearest-case comparison against the store
//!
//! Scores a query vector against every stored reference with a weighted
//! similarity (histogram correlation plus per-scalar closeness), averages
//! the best matches per label, and votes a verdict from the gap between
//! the two averages. The matcher never fails: an empty label side simply
//! contributes an average of zero.

use std::sync::Arc;

use crate::features::FeatureVector;
use crate::result::{AnalysisResult, ProgressionStage};

use super::store::{ReferenceEntry, ReferenceLabel, ReferenceStore};

// ============================================================================
// SIMILARITY WEIGHTS
// ============================================================================

/// Weight of the intensity-histogram correlation term.
const HISTOGRAM_WEIGHT: f64 = 0.15;

/// Per-scalar weights, paired with accessors below. Together with the
/// histogram term these sum to 1.0.
const VENTRICLE_WEIGHT: f64 = 0.20;
const SULCI_WEIGHT: f64 = 0.15;
const SYMMETRY_WEIGHT: f64 = 0.10;
const GRAY_WHITE_WEIGHT: f64 = 0.10;
const LESION_WEIGHT: f64 = 0.10;
const TEMPORAL_WEIGHT: f64 = 0.10;
const BRIGHT_WEIGHT: f64 = 0.04;
const MEAN_WEIGHT: f64 = 0.03;
const STD_WEIGHT: f64 = 0.03;

/// How many best matches per label feed the verdict.
const TOP_MATCHES: usize = 3;

/// Similarity gap to confidence scale factor.
const CONFIDENCE_SCALE: f64 = 200.0;

// ============================================================================
// SIMILARITY
// ============================================================================

/// Relative closeness of two scalars in [0, 1]. Two exact zeros are a
/// perfect match.
fn scalar_similarity(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return 1.0;
    }
    1.0 - ((a - b).abs() / scale).min(1.0)
}

/// Cosine correlation of two normalized histograms, floored at 0.
fn histogram_correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).max(0.0)
}

/// Weighted similarity of two feature vectors in [0, 1].
pub fn similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    HISTOGRAM_WEIGHT * histogram_correlation(&a.histogram, &b.histogram)
        + VENTRICLE_WEIGHT * scalar_similarity(a.ventricle_ratio, b.ventricle_ratio)
        + SULCI_WEIGHT * scalar_similarity(a.sulci_width, b.sulci_width)
        + SYMMETRY_WEIGHT * scalar_similarity(a.symmetry_score, b.symmetry_score)
        + GRAY_WHITE_WEIGHT * scalar_similarity(a.gray_white_ratio, b.gray_white_ratio)
        + LESION_WEIGHT * scalar_similarity(a.white_matter_lesion_pct, b.white_matter_lesion_pct)
        + TEMPORAL_WEIGHT * scalar_similarity(a.temporal_atrophy, b.temporal_atrophy)
        + BRIGHT_WEIGHT * scalar_similarity(a.bright_ratio, b.bright_ratio)
        + MEAN_WEIGHT * scalar_similarity(a.mean_intensity, b.mean_intensity)
        + STD_WEIGHT * scalar_similarity(a.std_intensity, b.std_intensity)
}

// ============================================================================
// MATCHER
// ============================================================================

/// Nearest-case classifier backed by a shared reference store.
pub struct ReferenceMatcher {
    store: Arc<ReferenceStore>,
}

impl ReferenceMatcher {
    pub fn new(store: Arc<ReferenceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    /// Compare a query vector against the store and vote a verdict from the
    /// gap between the best normal and best abnormal matches.
    pub fn match_features(&self, features: &FeatureVector) -> AnalysisResult {
        let entries = self.store.snapshot();

        let mut normal: Vec<(f64, &ReferenceEntry)> = Vec::new();
        let mut abnormal: Vec<(f64, &ReferenceEntry)> = Vec::new();
        for entry in &entries {
            let score = similarity(features, &entry.features);
            match entry.label {
                ReferenceLabel::Normal => normal.push((score, entry)),
                ReferenceLabel::Abnormal => abnormal.push((score, entry)),
            }
        }
        normal.sort_by(|a, b| b.0.total_cmp(&a.0));
        abnormal.sort_by(|a, b| b.0.total_cmp(&a.0));
        normal.truncate(TOP_MATCHES);
        abnormal.truncate(TOP_MATCHES);

        let average = |matches: &[(f64, &ReferenceEntry)]| {
            if matches.is_empty() {
                0.0
            } else {
                matches.iter().map(|(s, _)| s).sum::<f64>() / matches.len() as f64
            }
        };
        let normal_avg = average(&normal);
        let abnormal_avg = average(&abnormal);

        // Normal wins only on strictly greater similarity; a tie (including
        // an empty store) falls to the abnormal side at zero confidence
        let detection = abnormal_avg >= normal_avg;
        let confidence = ((abnormal_avg - normal_avg).abs() * CONFIDENCE_SCALE).min(100.0);

        let mut result = AnalysisResult {
            detection,
            confidence,
            observations: vec![
                format!("Average similarity to normal references: {:.3}", normal_avg),
                format!(
                    "Average similarity to abnormal references: {:.3}",
                    abnormal_avg
                ),
            ],
            ..AnalysisResult::default()
        };

        if detection {
            result.disorder_type = Some(Self::vote_disorder(&abnormal));
            if let Some(pct) = Self::mean_progression(&abnormal) {
                result.progression_pct = Some(pct);
                result.progression_stage = Some(ProgressionStage::from_pct(pct));
            }
            result
                .recommendations
                .push("Review closest matching reference cases".to_string());
        }

        log::debug!(
            "reference match over {} entries: normal={:.3} abnormal={:.3} detection={}",
            entries.len(),
            normal_avg,
            abnormal_avg,
            detection
        );
        result
    }

    /// Majority vote over the disorder labels of the top abnormal matches,
    /// ties broken by match rank.
    fn vote_disorder(matches: &[(f64, &ReferenceEntry)]) -> String {
        let mut votes: Vec<(&str, usize)> = Vec::new();
        for (_, entry) in matches {
            if let Some(disorder) = entry.metadata.disorder_type.as_deref() {
                match votes.iter_mut().find(|(name, _)| *name == disorder) {
                    Some((_, count)) => *count += 1,
                    None => votes.push((disorder, 1)),
                }
            }
        }
        let mut best: Option<(&str, usize)> = None;
        for (name, count) in votes {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((name, count));
            }
        }
        best.map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "Unspecified neurodegenerative disorder".to_string())
    }

    fn mean_progression(matches: &[(f64, &ReferenceEntry)]) -> Option<f64> {
        let values: Vec<f64> = matches
            .iter()
            .filter_map(|(_, e)| e.metadata.progression_pct)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
