//! Fusion input types
//!
//! A `Verdict` is one classifier's opinion in a common shape; a
//! `SourceVerdict` tags it with the classifier's name and reliability
//! weight. `OracleVerdict` is the caller-supplied verdict of an external
//! model, outside this crate's control.

use serde::{Deserialize, Serialize};

use crate::result::AnalysisResult;

/// One classifier's opinion about a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether this source sees an abnormality
    pub detection: bool,
    /// Confidence in this source's own outcome, 0-100
    pub confidence: f64,
    pub disorder_type: Option<String>,
    pub progression_pct: Option<f64>,
    pub observations: Vec<String>,
    pub affected_regions: Vec<String>,
    pub recommendations: Vec<String>,
}

impl From<AnalysisResult> for Verdict {
    fn from(result: AnalysisResult) -> Self {
        Self {
            detection: result.detection,
            confidence: result.confidence,
            disorder_type: result.disorder_type,
            progression_pct: result.progression_pct,
            observations: result.observations,
            affected_regions: result.affected_regions,
            recommendations: result.recommendations,
        }
    }
}

/// A verdict together with its source's identity and reliability weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceVerdict {
    pub name: String,
    /// Relative trust in this source, renormalized over present sources
    pub reliability: f64,
    pub verdict: Verdict,
}

impl SourceVerdict {
    pub fn new(name: impl Into<String>, reliability: f64, verdict: Verdict) -> Self {
        Self {
            name: name.into(),
            reliability,
            verdict,
        }
    }
}

/// Verdict of an external model, injected by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleVerdict {
    pub detection: bool,
    /// 0-100
    pub confidence: f64,
    pub disorder_type: Option<String>,
    pub progression_pct: Option<f64>,
    #[serde(default)]
    pub observations: Vec<String>,
}

impl From<OracleVerdict> for Verdict {
    fn from(oracle: OracleVerdict) -> Self {
        Self {
            detection: oracle.detection,
            confidence: oracle.confidence.clamp(0.0, 100.0),
            disorder_type: oracle.disorder_type,
            progression_pct: oracle.progression_pct,
            observations: oracle.observations,
            affected_regions: vec![],
            recommendations: vec![],
        }
    }
}
