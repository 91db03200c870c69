//! Features module - scan preprocessing and feature extraction
//!
//! Pipeline: adaptive contrast normalization -> smoothing -> mask
//! segmentation -> per-feature measurements, producing one immutable
//! `FeatureVector` per scan.

pub mod extractor;
pub mod layout;
pub mod ops;
pub mod vector;


// Re-export common items
pub use extractor::extract;
pub use layout::{layout_hash, LayoutInfo, FEATURE_VERSION, HISTOGRAM_BINS, SCALAR_COUNT, SCALAR_LAYOUT};
pub use vector::{FeatureVector, GRAY_WHITE_REFERENCE};
