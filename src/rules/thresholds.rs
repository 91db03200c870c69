//! Threshold profile - tiered rules for the rule engine
//!
//! Data only, no classification logic. A profile is an immutable value:
//! the calibrator builds a fresh one and swaps it in wholesale, so readers
//! never observe a half-updated profile.

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::scan::AgeGroup;

// ============================================================================
// SEVERITY
// ============================================================================

/// Severity of one triggered abnormality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Borderline,
    Mild,
    Moderate,
    /// Binary features (lesion load, temporal atrophy) report this instead
    /// of a graded tier.
    Significant,
    Severe,
}

impl Severity {
    /// Contribution weight in the abnormality score.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Borderline => 0.2,
            Severity::Mild => 0.4,
            Severity::Moderate => 0.7,
            Severity::Significant => 0.8,
            Severity::Severe => 1.0,
        }
    }

    /// Contribution to the progression percentage.
    pub fn progression_score(&self) -> f64 {
        match self {
            Severity::Borderline => 20.0,
            Severity::Mild => 40.0,
            Severity::Moderate => 70.0,
            Severity::Significant => 75.0,
            Severity::Severe => 90.0,
        }
    }

    /// Capitalized label for observations.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Borderline => "Borderline",
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Significant => "Significant",
            Severity::Severe => "Severe",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// TIER BOUNDS
// ============================================================================

/// Nested tier cutoffs on an ascending abnormality axis.
/// Invariant: `normal_max <= mild_max <= moderate_max <= severe_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBounds {
    pub normal_max: f64,
    pub mild_max: f64,
    pub moderate_max: f64,
    pub severe_min: f64,
}

impl TierBounds {
    pub fn new(normal_max: f64, mild_max: f64, moderate_max: f64, severe_min: f64) -> Self {
        Self {
            normal_max,
            mild_max,
            moderate_max,
            severe_min,
        }
    }

    /// Whether the tier ordering invariant holds.
    pub fn is_ordered(&self) -> bool {
        self.normal_max <= self.mild_max
            && self.mild_max <= self.moderate_max
            && self.moderate_max <= self.severe_min
    }

    /// Restore the ordering invariant by pushing each bound up to at least
    /// the one below it.
    pub fn clamped(self) -> Self {
        let normal_max = self.normal_max;
        let mild_max = self.mild_max.max(normal_max);
        let moderate_max = self.moderate_max.max(mild_max);
        let severe_min = self.severe_min.max(moderate_max);
        Self {
            normal_max,
            mild_max,
            moderate_max,
            severe_min,
        }
    }

    /// Locate the tier for a value on this axis; `None` while normal.
    pub fn tier_for(&self, value: f64) -> Option<Severity> {
        if value > self.severe_min {
            Some(Severity::Severe)
        } else if value > self.moderate_max {
            Some(Severity::Moderate)
        } else if value > self.mild_max {
            Some(Severity::Mild)
        } else if value > self.normal_max {
            Some(Severity::Borderline)
        } else {
            None
        }
    }
}

// ============================================================================
// BINARY CUTOFFS
// ============================================================================

/// Two-level cutoffs for the binary features (lesion load, temporal
/// atrophy), which report mild or significant rather than a graded tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryCutoffs {
    pub mild_min: f64,
    pub significant_min: f64,
}

impl BinaryCutoffs {
    pub fn new(mild_min: f64, significant_min: f64) -> Self {
        Self {
            mild_min,
            significant_min,
        }
    }

    pub fn severity_for(&self, value: f64) -> Option<Severity> {
        if value > self.significant_min {
            Some(Severity::Significant)
        } else if value > self.mild_min {
            Some(Severity::Mild)
        } else {
            None
        }
    }
}

// ============================================================================
// CATEGORY WEIGHTS
// ============================================================================

/// How much each abnormality category contributes to the overall score.
/// The four primary categories sum to 1.0; lesion load and temporal atrophy
/// add smaller fixed increments on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub ventricle: f64,
    pub atrophy: f64,
    pub symmetry: f64,
    pub gray_white: f64,
    pub lesion: f64,
    pub temporal: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            ventricle: 0.40,
            atrophy: 0.30,
            symmetry: 0.15,
            gray_white: 0.15,
            lesion: 0.20,
            temporal: 0.20,
        }
    }
}

// ============================================================================
// TIERED FEATURES
// ============================================================================

/// The four tier-graded features, each evaluated on an ascending axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TieredFeature {
    VentricleRatio,
    SulciWidth,
    Asymmetry,
    GrayWhiteLoss,
}

impl TieredFeature {
    pub const ALL: [TieredFeature; 4] = [
        TieredFeature::VentricleRatio,
        TieredFeature::SulciWidth,
        TieredFeature::Asymmetry,
        TieredFeature::GrayWhiteLoss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TieredFeature::VentricleRatio => "ventricle_ratio",
            TieredFeature::SulciWidth => "sulci_width",
            TieredFeature::Asymmetry => "asymmetry",
            TieredFeature::GrayWhiteLoss => "gray_white_loss",
        }
    }

    /// Read this feature's tier-axis value out of a vector.
    pub fn axis_value(&self, features: &FeatureVector) -> f64 {
        match self {
            TieredFeature::VentricleRatio => features.ventricle_ratio,
            TieredFeature::SulciWidth => features.sulci_width,
            TieredFeature::Asymmetry => features.asymmetry(),
            TieredFeature::GrayWhiteLoss => features.gray_white_loss(),
        }
    }
}

// ============================================================================
// AGE THRESHOLDS
// ============================================================================

/// Complete rule set for one age group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeThresholds {
    pub ventricle: TierBounds,
    pub sulci: TierBounds,
    pub asymmetry: TierBounds,
    pub gray_white_loss: TierBounds,
    pub lesion: BinaryCutoffs,
    pub temporal: BinaryCutoffs,
    pub weights: CategoryWeights,
    /// Confidence multiplier (elderly scans tolerate more atrophy).
    pub age_multiplier: f64,
}

impl AgeThresholds {
    pub fn bounds_for(&self, feature: TieredFeature) -> &TierBounds {
        match feature {
            TieredFeature::VentricleRatio => &self.ventricle,
            TieredFeature::SulciWidth => &self.sulci,
            TieredFeature::Asymmetry => &self.asymmetry,
            TieredFeature::GrayWhiteLoss => &self.gray_white_loss,
        }
    }

    fn with_defaults(ventricle_normal_max: f64, sulci_normal_max: f64, age_multiplier: f64) -> Self {
        Self {
            ventricle: TierBounds::new(ventricle_normal_max, 8.0, 12.0, 12.0),
            sulci: TierBounds::new(sulci_normal_max, 5.0, 7.0, 7.0),
            asymmetry: TierBounds::new(0.15, 0.20, 0.25, 0.30),
            gray_white_loss: TierBounds::new(0.30, 0.40, 0.45, 0.45),
            lesion: BinaryCutoffs::new(5.0, 10.0),
            temporal: BinaryCutoffs::new(1.2, 1.4),
            weights: CategoryWeights::default(),
            age_multiplier,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.ventricle.is_ordered()
            && self.sulci.is_ordered()
            && self.asymmetry.is_ordered()
            && self.gray_white_loss.is_ordered()
    }
}

// ============================================================================
// THRESHOLD PROFILE
// ============================================================================

/// Per-age-group rule sets. Replaced wholesale by calibration, never
/// partially mutated while in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub child: AgeThresholds,
    pub adult: AgeThresholds,
    pub elderly: AgeThresholds,
}

impl ThresholdProfile {
    pub fn for_age_group(&self, group: AgeGroup) -> &AgeThresholds {
        match group {
            AgeGroup::Child => &self.child,
            AgeGroup::Adult => &self.adult,
            AgeGroup::Elderly => &self.elderly,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.child.is_ordered() && self.adult.is_ordered() && self.elderly.is_ordered()
    }
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self {
            child: AgeThresholds::with_defaults(4.0, 2.0, 1.2),
            adult: AgeThresholds::with_defaults(5.0, 3.0, 1.0),
            elderly: AgeThresholds::with_defaults(7.0, 4.0, 0.8),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
