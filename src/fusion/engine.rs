//! Ensemble fusion - reliability-weighted combination of verdicts
//!
//! Each usable source contributes effective mass equal to its renormalized
//! reliability times its own confidence. The detection score is the share
//! of that mass held by detecting sources; 0.5 is the decision point, and
//! final confidence grows with the distance from it.

use crate::error::AnalysisError;
use crate::result::{AnalysisResult, ProgressionStage};
use crate::Result;

use super::types::SourceVerdict;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default reliability of the threshold rule engine.
pub const RULES_RELIABILITY: f64 = 0.40;
/// Default reliability of the reference matcher.
pub const REFERENCE_RELIABILITY: f64 = 0.35;
/// Default reliability of an external oracle model.
pub const ORACLE_RELIABILITY: f64 = 0.25;

/// Detection-score distance from 0.5 is scaled by this into confidence.
const CONFIDENCE_SCALE: f64 = 200.0;
/// A fused verdict never claims less than this confidence.
const CONFIDENCE_FLOOR: f64 = 30.0;

// ============================================================================
// FUSION
// ============================================================================

/// Fuse source verdicts into a single result. With no usable source (none
/// present, or all at zero reliability or zero confidence) this returns a
/// terminal zero-confidence negative rather than an error.
pub fn fuse(sources: &[SourceVerdict]) -> AnalysisResult {
    let usable: Vec<&SourceVerdict> = sources
        .iter()
        .filter(|s| s.reliability > 0.0 && s.verdict.confidence > 0.0)
        .collect();

    if usable.is_empty() {
        log::warn!("fusion ran with no usable classifier output");
        return AnalysisResult {
            detection: false,
            confidence: 0.0,
            observations: vec!["Analysis failed: no usable classifier output".to_string()],
            ..AnalysisResult::default()
        };
    }

    // Renormalize reliabilities over the sources actually present
    let reliability_sum: f64 = usable.iter().map(|s| s.reliability).sum();

    let mut total_mass = 0.0f64;
    let mut detecting_mass = 0.0f64;
    for source in &usable {
        let weight = source.reliability / reliability_sum;
        let mass = weight * (source.verdict.confidence / 100.0);
        total_mass += mass;
        if source.verdict.detection {
            detecting_mass += mass;
        }
    }
    let detection_score = detecting_mass / total_mass;
    let detection = detection_score >= 0.5;
    let confidence =
        ((detection_score - 0.5).abs() * CONFIDENCE_SCALE).clamp(CONFIDENCE_FLOOR, 100.0);

    let mut result = AnalysisResult {
        detection,
        confidence,
        ..AnalysisResult::default()
    };

    // Union the textual outputs, preserving order and dropping duplicates
    let mut push_unique = |target: &mut Vec<String>, items: &[String]| {
        for item in items {
            if !target.contains(item) {
                target.push(item.clone());
            }
        }
    };
    for source in &usable {
        push_unique(&mut result.observations, &source.verdict.observations);
        push_unique(&mut result.affected_regions, &source.verdict.affected_regions);
        push_unique(&mut result.recommendations, &source.verdict.recommendations);
    }
    let source_names: Vec<&str> = usable.iter().map(|s| s.name.as_str()).collect();
    result.observations.push(format!(
        "Consensus of {} classifier(s) [{}], detection score {:.2}",
        usable.len(),
        source_names.join(", "),
        detection_score
    ));

    if detection {
        result.disorder_type = vote_disorder(&usable);
        if let Some(pct) = weighted_progression(&usable) {
            result.progression_pct = Some(pct);
            result.progression_stage = Some(ProgressionStage::from_pct(pct));
        }
    }

    log::debug!(
        "fused {} source(s): score={:.3} detection={} confidence={:.1}",
        usable.len(),
        detection_score,
        detection,
        confidence
    );
    result
}

/// Like [`fuse`], but treats the no-usable-source case as an error.
pub fn fuse_strict(sources: &[SourceVerdict]) -> Result<AnalysisResult> {
    let any_usable = sources
        .iter()
        .any(|s| s.reliability > 0.0 && s.verdict.confidence > 0.0);
    if !any_usable {
        return Err(AnalysisError::NoData);
    }
    Ok(fuse(sources))
}

/// Disorder named by the detecting source with the highest
/// reliability-times-confidence product.
fn vote_disorder(usable: &[&SourceVerdict]) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for source in usable {
        if !source.verdict.detection {
            continue;
        }
        if let Some(disorder) = source.verdict.disorder_type.as_deref() {
            let strength = source.reliability * source.verdict.confidence;
            if best.map_or(true, |(s, _)| strength > s) {
                best = Some((strength, disorder));
            }
        }
    }
    best.map(|(_, disorder)| disorder.to_string())
}

/// Confidence-weighted mean progression over detecting sources.
fn weighted_progression(usable: &[&SourceVerdict]) -> Option<f64> {
    let mut weight_sum = 0.0f64;
    let mut weighted = 0.0f64;
    for source in usable {
        if !source.verdict.detection {
            continue;
        }
        if let Some(pct) = source.verdict.progression_pct {
            let weight = source.verdict.confidence;
            weight_sum += weight;
            weighted += weight * pct;
        }
    }
    if weight_sum > 0.0 {
        Some(weighted / weight_sum)
    } else {
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::types::Verdict;

    fn verdict(detection: bool, confidence: f64) -> Verdict {
        Verdict {
            detection,
            confidence,
            disorder_type: None,
            progression_pct: None,
            observations: vec![],
            affected_regions: vec![],
            recommendations: vec![],
        }
    }

    fn source(name: &str, reliability: f64, v: Verdict) -> SourceVerdict {
        SourceVerdict::new(name, reliability, v)
    }

    #[test]
    fn test_no_sources_is_terminal_negative() {
        let result = fuse(&[]);
        assert!(!result.detection);
        assert_eq!(result.confidence, 0.0);
        assert!(result.observations[0].contains("no usable classifier output"));
    }

    #[test]
    fn test_zero_confidence_sources_are_unusable() {
        let sources = vec![source("rules", RULES_RELIABILITY, verdict(true, 0.0))];
        let result = fuse(&sources);
        assert!(!result.detection);
        assert_eq!(result.confidence, 0.0);
        assert!(fuse_strict(&sources).is_err());
    }

    #[test]
    fn test_fuse_strict_errors_without_sources() {
        assert!(matches!(fuse_strict(&[]), Err(AnalysisError::NoData)));
    }

    #[test]
    fn test_agreeing_sources_reach_full_confidence() {
        let sources = vec![
            source("rules", RULES_RELIABILITY, verdict(true, 80.0)),
            source("reference", REFERENCE_RELIABILITY, verdict(true, 60.0)),
        ];
        let result = fuse(&sources);
        assert!(result.detection);
        assert_eq!(result.confidence, 100.0);
    }

    #[test]
    fn test_split_sources_land_near_decision_point() {
        // rules detects at 80, reference disagrees at 60; with weights
        // 0.40/0.35 renormalized, the detection score is ~0.60
        let sources = vec![
            source("rules", RULES_RELIABILITY, verdict(true, 80.0)),
            source("reference", REFERENCE_RELIABILITY, verdict(false, 60.0)),
        ];
        let result = fuse(&sources);
        assert!(result.detection);
        // Distance from 0.5 scales to ~20.8, lifted to the floor
        assert_eq!(result.confidence, 30.0);
    }

    #[test]
    fn test_single_source_dominates() {
        let sources = vec![source("rules", RULES_RELIABILITY, verdict(false, 90.0))];
        let result = fuse(&sources);
        assert!(!result.detection);
        assert_eq!(result.confidence, 100.0);
    }

    #[test]
    fn test_disorder_from_strongest_detecting_source() {
        let mut rules_verdict = verdict(true, 60.0);
        rules_verdict.disorder_type = Some("Vascular dementia".to_string());
        let mut oracle_verdict = verdict(true, 95.0);
        oracle_verdict.disorder_type = Some("Alzheimer's disease".to_string());

        // 0.40 * 60 = 24 for rules, 0.25 * 95 = 23.75 for the oracle
        let sources = vec![
            source("rules", RULES_RELIABILITY, rules_verdict),
            source("oracle", ORACLE_RELIABILITY, oracle_verdict),
        ];
        let result = fuse(&sources);
        assert!(result.detection);
        assert_eq!(result.disorder_type.as_deref(), Some("Vascular dementia"));
    }

    #[test]
    fn test_progression_is_confidence_weighted() {
        let mut a = verdict(true, 80.0);
        a.progression_pct = Some(50.0);
        let mut b = verdict(true, 20.0);
        b.progression_pct = Some(100.0);
        let sources = vec![
            source("rules", RULES_RELIABILITY, a),
            source("reference", REFERENCE_RELIABILITY, b),
        ];
        let result = fuse(&sources);
        // (80*50 + 20*100) / 100 = 60
        assert_eq!(result.progression_pct, Some(60.0));
        assert_eq!(result.progression_stage, Some(ProgressionStage::Moderate));
    }

    #[test]
    fn test_textual_outputs_are_deduplicated() {
        let mut a = verdict(true, 80.0);
        a.observations = vec!["Severe ventricular enlargement".to_string()];
        a.affected_regions = vec!["Lateral ventricles".to_string()];
        let mut b = verdict(true, 70.0);
        b.observations = vec!["Severe ventricular enlargement".to_string()];
        b.affected_regions = vec!["Lateral ventricles".to_string()];
        let sources = vec![
            source("rules", RULES_RELIABILITY, a),
            source("reference", REFERENCE_RELIABILITY, b),
        ];
        let result = fuse(&sources);
        assert_eq!(
            result
                .observations
                .iter()
                .filter(|o| o.contains("ventricular"))
                .count(),
            1
        );
        assert_eq!(result.affected_regions.len(), 1);
    }

    #[test]
    fn test_provenance_note_names_contributing_sources() {
        let sources = vec![
            source("rules", RULES_RELIABILITY, verdict(true, 80.0)),
            source("reference", REFERENCE_RELIABILITY, verdict(false, 60.0)),
        ];
        let result = fuse(&sources);
        let note = result
            .observations
            .iter()
            .find(|o| o.contains("Consensus"))
            .expect("missing provenance note");
        assert!(note.contains("rules"), "note was {:?}", note);
        assert!(note.contains("reference"), "note was {:?}", note);
    }

    #[test]
    fn test_weights_renormalize_over_present_sources() {
        // A lone low-reliability source still carries full weight
        let sources = vec![source("oracle", ORACLE_RELIABILITY, verdict(true, 50.0))];
        let result = fuse(&sources);
        assert!(result.detection);
        assert_eq!(result.confidence, 100.0);
    }
}
