//! Scan input types
//!
//! `ScanImage` wraps a validated grayscale pixel array; `AgeGroup` buckets
//! an optional patient age into the threshold tier that applies.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

// ============================================================================
// SCAN IMAGE
// ============================================================================

/// A grayscale CT scan slice. Read-only once constructed; intensities are
/// 8-bit [0, 255].
#[derive(Debug, Clone)]
pub struct ScanImage {
    pixels: Array2<u8>,
}

impl ScanImage {
    /// Wrap an existing pixel array. Fails on zero-area input.
    pub fn new(pixels: Array2<u8>) -> Result<Self, AnalysisError> {
        let (h, w) = pixels.dim();
        if h == 0 || w == 0 {
            return Err(AnalysisError::Input(format!(
                "scan has zero area ({}x{})",
                h, w
            )));
        }
        Ok(Self { pixels })
    }

    /// Build from a row-major byte buffer.
    pub fn from_raw(data: Vec<u8>, height: usize, width: usize) -> Result<Self, AnalysisError> {
        if height == 0 || width == 0 {
            return Err(AnalysisError::Input(format!(
                "scan has zero area ({}x{})",
                height, width
            )));
        }
        if data.len() != height * width {
            return Err(AnalysisError::Input(format!(
                "buffer length {} does not match {}x{}",
                data.len(),
                height,
                width
            )));
        }
        let pixels = Array2::from_shape_vec((height, width), data)
            .map_err(|e| AnalysisError::Input(format!("shape error: {}", e)))?;
        Ok(Self { pixels })
    }

    pub fn pixels(&self) -> &Array2<u8> {
        &self.pixels
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }
}

// ============================================================================
// AGE GROUP
// ============================================================================

/// Age bucket selecting the applicable threshold tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    /// Under 18
    Child,
    /// 18 to 65 (default when age is unknown)
    Adult,
    /// Over 65
    Elderly,
}

impl AgeGroup {
    /// Bucket an optional patient age; unknown age defaults to `Adult`.
    pub fn from_age(age: Option<u32>) -> Self {
        match age {
            Some(a) if a < 18 => AgeGroup::Child,
            Some(a) if a > 65 => AgeGroup::Elderly,
            _ => AgeGroup::Adult,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Adult => "adult",
            AgeGroup::Elderly => "elderly",
        }
    }
}

impl Default for AgeGroup {
    fn default() -> Self {
        AgeGroup::Adult
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_valid() {
        let scan = ScanImage::from_raw(vec![0u8; 16], 4, 4).unwrap();
        assert_eq!(scan.dim(), (4, 4));
    }

    #[test]
    fn test_from_raw_empty_rejected() {
        assert!(ScanImage::from_raw(vec![], 0, 0).is_err());
        assert!(ScanImage::from_raw(vec![], 0, 4).is_err());
    }

    #[test]
    fn test_from_raw_length_mismatch_rejected() {
        assert!(ScanImage::from_raw(vec![0u8; 10], 4, 4).is_err());
    }

    #[test]
    fn test_age_group_buckets() {
        assert_eq!(AgeGroup::from_age(None), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(Some(10)), AgeGroup::Child);
        assert_eq!(AgeGroup::from_age(Some(17)), AgeGroup::Child);
        assert_eq!(AgeGroup::from_age(Some(18)), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(Some(65)), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(Some(66)), AgeGroup::Elderly);
        assert_eq!(AgeGroup::from_age(Some(70)), AgeGroup::Elderly);
    }
}
