//! Error taxonomy
//!
//! Explicit error kinds instead of catch-and-log: callers can tell an
//! unreadable image apart from "no abnormality found". Degenerate arithmetic
//! (zero-area masks) is guarded to neutral feature values in the extractor
//! and never surfaces here.

use thiserror::Error;

/// Errors surfaced by the inference core.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Unreadable or empty scan image. Raised immediately, no partial result.
    #[error("invalid scan input: {0}")]
    Input(String),

    /// Calibration was attempted against an empty labeled sample set.
    /// The active threshold profile is left untouched.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// No classifier produced usable output for fusion.
    /// Only surfaced by `fuse_strict`; plain `fuse` returns a terminal
    /// zero-confidence result instead.
    #[error("no usable classifier output")]
    NoData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::Input("empty image".to_string());
        assert_eq!(err.to_string(), "invalid scan input: empty image");

        let err = AnalysisError::InsufficientData("no normal samples".to_string());
        assert!(err.to_string().contains("insufficient data"));
    }
}
