//! # neuroscan-core
//!
//! Deterministic inference core for neurodegeneration screening on brain
//! CT scans. Not a medical device: outputs are heuristic risk indicators,
//! not diagnoses.
//!
//! ## Structure
//! - `features`: scan preprocessing and feature extraction
//! - `rules`: tiered threshold classifier + statistical calibration
//! - `reference`: labeled reference store and similarity matcher
//! - `fusion`: reliability-weighted ensemble combination
//! - `analyzer`: `Classifier` trait and the top-level facade
//!
//! ## Usage
//! ```ignore
//! use neuroscan_core::{Analyzer, ScanImage};
//!
//! let analyzer = Analyzer::new();
//! let scan = ScanImage::from_raw(pixels, height, width)?;
//! let result = analyzer.analyze(&scan, Some(70), None)?;
//! if result.detection {
//!     println!("abnormal ({}% confidence)", result.confidence);
//! }
//! ```

pub mod analyzer;
pub mod error;
pub mod features;
pub mod fusion;
pub mod reference;
pub mod result;
pub mod rules;
pub mod scan;

pub use analyzer::{Analyzer, Classifier, OracleAdapter};
pub use error::AnalysisError;
pub use features::{extract, FeatureVector};
pub use fusion::{fuse, OracleVerdict, SourceVerdict, Verdict};
pub use reference::{ReferenceEntry, ReferenceLabel, ReferenceMatcher, ReferenceMetadata, ReferenceStore};
pub use result::{AnalysisResult, ProgressionStage};
pub use rules::{CalibrationReport, RuleEngine, ThresholdProfile};
pub use scan::{AgeGroup, ScanImage};

/// Result type for neuroscan-core operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
