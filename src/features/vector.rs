//! Feature vector - the immutable output of extraction
//!
//! Named scalars plus a 256-bin normalized intensity histogram. Produced
//! once per scan and never mutated afterwards; the layout metadata lets
//! persisted vectors be checked against the current schema.

use serde::{Deserialize, Serialize};

use super::layout::{layout_hash, FEATURE_VERSION, HISTOGRAM_BINS, SCALAR_LAYOUT};

/// Reference gray/white differentiation ratio used to express the ratio as
/// an ascending "loss" axis for tier lookup. A healthy scan sits around
/// 1.2-1.5; anything at or above the reference maps to zero loss.
pub const GRAY_WHITE_REFERENCE: f64 = 1.5;

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Extracted scan features. All ratios are >= 0; `symmetry_score` is in
/// [0, 1]. A `gray_white_ratio` or `temporal_atrophy` of exactly 0 is the
/// degenerate sentinel for "mask was empty, no measurement".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Scalar layout version at extraction time
    pub layout_version: u8,
    /// CRC32 hash of the scalar layout (for drift detection)
    pub layout_hash: u32,

    /// Ventricle area as a percentage of brain-mask area
    pub ventricle_ratio: f64,
    /// Cortical edge density, a sulci-width / atrophy proxy
    pub sulci_width: f64,
    /// 1 - normalized left/right mirror difference
    pub symmetry_score: f64,
    /// Mean-intensity ratio of bright over dark brain submasks
    pub gray_white_ratio: f64,
    /// Hypointense patches as a percentage of inner white matter
    pub white_matter_lesion_pct: f64,
    /// Temporal-region darkness relative to whole-brain darkness
    pub temporal_atrophy: f64,
    /// Fraction of pixels above intensity 180 (skull, calcifications)
    pub bright_ratio: f64,
    pub mean_intensity: f64,
    pub std_intensity: f64,

    /// Normalized 256-bin intensity histogram
    pub histogram: Vec<f64>,
}

impl FeatureVector {
    /// Zeroed vector stamped with the current layout.
    pub fn zeroed() -> Self {
        Self {
            layout_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            ventricle_ratio: 0.0,
            sulci_width: 0.0,
            symmetry_score: 0.0,
            gray_white_ratio: 0.0,
            white_matter_lesion_pct: 0.0,
            temporal_atrophy: 0.0,
            bright_ratio: 0.0,
            mean_intensity: 0.0,
            std_intensity: 0.0,
            histogram: vec![0.0; HISTOGRAM_BINS],
        }
    }

    /// Scalar lookup by layout name.
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "ventricle_ratio" => Some(self.ventricle_ratio),
            "sulci_width" => Some(self.sulci_width),
            "symmetry_score" => Some(self.symmetry_score),
            "gray_white_ratio" => Some(self.gray_white_ratio),
            "white_matter_lesion_pct" => Some(self.white_matter_lesion_pct),
            "temporal_atrophy" => Some(self.temporal_atrophy),
            "bright_ratio" => Some(self.bright_ratio),
            "mean_intensity" => Some(self.mean_intensity),
            "std_intensity" => Some(self.std_intensity),
            _ => None,
        }
    }

    /// Scalars in canonical layout order.
    pub fn scalars(&self) -> Vec<f64> {
        SCALAR_LAYOUT
            .iter()
            .map(|name| self.get(name).unwrap_or(0.0))
            .collect()
    }

    /// Ascending asymmetry axis for tier lookup (0 = perfectly symmetric).
    pub fn asymmetry(&self) -> f64 {
        (1.0 - self.symmetry_score).max(0.0)
    }

    /// Ascending gray/white differentiation loss axis. The degenerate
    /// sentinel (ratio of exactly 0) maps to zero loss so it triggers no tier.
    pub fn gray_white_loss(&self) -> f64 {
        if self.gray_white_ratio <= 0.0 {
            return 0.0;
        }
        (GRAY_WHITE_REFERENCE - self.gray_white_ratio).max(0.0)
    }

    /// Whether this vector matches the current scalar layout.
    pub fn is_layout_compatible(&self) -> bool {
        super::layout::is_layout_compatible(self.layout_version, self.layout_hash)
    }

    /// JSON rendering for structured logs.
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "layout_version": self.layout_version,
            "layout_hash": self.layout_hash,
            "scalars": SCALAR_LAYOUT.iter()
                .map(|name| (name.to_string(), self.get(name).unwrap_or(0.0)))
                .collect::<std::collections::HashMap<_, _>>(),
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

// ============================================================================
// TESTS
// ============================================================================
