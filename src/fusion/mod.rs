//! Fusion module - ensemble combination of classifier verdicts
//!
//! Collects per-classifier verdicts and fuses them into one result by
//! reliability-weighted voting.

pub mod engine;
pub mod types;

// Re-export common items
pub use engine::{
    fuse, fuse_strict, ORACLE_RELIABILITY, REFERENCE_RELIABILITY, RULES_RELIABILITY,
};
pub use types::{OracleVerdict, SourceVerdict, Verdict};
