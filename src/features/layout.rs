//! Feature layout - centralized scalar feature definition
//!
//! The scalar feature schema is versioned and hashed so that persisted
//! reference entries and calibration audits can detect layout drift.
//!
//! ## Rules (NEVER break these):
//! 1. Add a scalar feature -> increment FEATURE_VERSION
//! 2. Change order -> increment FEATURE_VERSION
//! 3. Remove a feature -> increment FEATURE_VERSION

use crc32fast::Hasher;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current scalar-feature layout version.
/// MUST be incremented when the layout changes.
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// SCALAR LAYOUT (authoritative source)
// ============================================================================

/// Scalar feature names in canonical order.
pub const SCALAR_LAYOUT: &[&str] = &[
    "ventricle_ratio",         // 0: ventricle area as % of brain-mask area
    "sulci_width",             // 1: cortical edge density (atrophy proxy)
    "symmetry_score",          // 2: 1 - normalized mirror difference, [0,1]
    "gray_white_ratio",        // 3: bright/dark submask mean-intensity ratio
    "white_matter_lesion_pct", // 4: hypointense % of inner white matter
    "temporal_atrophy",        // 5: temporal-region darkness vs whole brain
    "bright_ratio",            // 6: fraction of pixels above 180
    "mean_intensity",          // 7: whole-image mean
    "std_intensity",           // 8: whole-image standard deviation
];

/// Total number of scalar features.
/// IMPORTANT: must match SCALAR_LAYOUT.len()!
pub const SCALAR_COUNT: usize = 9;

/// Bins in the normalized intensity histogram.
pub const HISTOGRAM_BINS: usize = 256;

// ============================================================================
// LAYOUT HASH
// ============================================================================

static LAYOUT_HASH: Lazy<u32> = Lazy::new(compute_layout_hash);

/// Compute the CRC32 hash of the scalar layout.
fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in SCALAR_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }
    hasher.finalize()
}

/// Layout hash for the current schema (cached).
pub fn layout_hash() -> u32 {
    *LAYOUT_HASH
}

/// Check whether a persisted vector's layout matches the current schema.
pub fn is_layout_compatible(version: u8, hash: u32) -> bool {
    version == FEATURE_VERSION && hash == layout_hash()
}

// ============================================================================
// INDEX LOOKUP
// ============================================================================

/// Get the scalar index by name (O(n), features are few).
pub fn feature_index(name: &str) -> Option<usize> {
    SCALAR_LAYOUT.iter().position(|&n| n == name)
}

/// Get the scalar name by index.
pub fn feature_name(index: usize) -> Option<&'static str> {
    SCALAR_LAYOUT.get(index).copied()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub scalar_count: usize,
    pub histogram_bins: usize,
    pub scalar_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            scalar_count: SCALAR_COUNT,
            histogram_bins: HISTOGRAM_BINS,
            scalar_names: SCALAR_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// TESTS
// ============================================================================
