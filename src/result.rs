//! Analysis result types
//!
//! The final output of every analysis path. Freshly constructed per call,
//! immutable once returned.

use serde::{Deserialize, Serialize};

// ============================================================================
// PROGRESSION STAGE
// ============================================================================

/// Disease progression bucket derived from the progression percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionStage {
    /// Below 25%
    Early,
    /// 25% to 50%
    Mild,
    /// 50% to 75%
    Moderate,
    /// 75% and above
    Severe,
}

impl ProgressionStage {
    pub fn from_pct(pct: f64) -> Self {
        if pct < 25.0 {
            ProgressionStage::Early
        } else if pct < 50.0 {
            ProgressionStage::Mild
        } else if pct < 75.0 {
            ProgressionStage::Moderate
        } else {
            ProgressionStage::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressionStage::Early => "Early",
            ProgressionStage::Mild => "Mild",
            ProgressionStage::Moderate => "Moderate",
            ProgressionStage::Severe => "Severe",
        }
    }
}

impl std::fmt::Display for ProgressionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ANALYSIS RESULT
// ============================================================================

/// Final analysis output, consumable by any presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Whether an abnormality was detected
    pub detection: bool,
    /// Confidence in the stated detection outcome, 0-100
    pub confidence: f64,
    /// Named disorder pattern, when detected
    pub disorder_type: Option<String>,
    /// Progression bucket, when detected
    pub progression_stage: Option<ProgressionStage>,
    /// Progression percentage 0-100, when detected
    pub progression_pct: Option<f64>,
    /// Human-readable findings
    pub observations: Vec<String>,
    /// Anatomical regions implicated by the findings
    pub affected_regions: Vec<String>,
    /// Follow-up suggestions
    pub recommendations: Vec<String>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            detection: false,
            confidence: 0.0,
            disorder_type: None,
            progression_stage: None,
            progression_pct: None,
            observations: vec![],
            affected_regions: vec![],
            recommendations: vec![],
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
