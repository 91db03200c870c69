//! Reference module - labeled case store and nearest-case matching
//!
//! The store keeps feature vectors of previously labeled scans; the matcher
//! votes a verdict for a new scan from its closest matches on each side.

pub mod matcher;
pub mod store;

// Re-export common items
pub use matcher::{similarity, ReferenceMatcher};
pub use store::{ReferenceEntry, ReferenceLabel, ReferenceMetadata, ReferenceStore};
