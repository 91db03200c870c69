//! Feature extraction pipeline
//!
//! Turns a validated scan into a `FeatureVector` in one deterministic pass:
//! contrast normalization, smoothing, mask segmentation, then the individual
//! feature measurements. A zero-area brain mask is not an error; every
//! mask-dependent ratio degrades to 0 and extraction still succeeds.

use ndarray::Array2;

use crate::scan::ScanImage;

use super::ops::{
    adaptive_equalize, close, erode, gaussian_blur, mask_and, mask_area, masked_mean,
    normalized_histogram, open, otsu_threshold, sobel_edges, threshold_above, threshold_below,
};
use super::vector::FeatureVector;

// ============================================================================
// SEGMENTATION THRESHOLDS
// ============================================================================

/// Brain tissue sits above this global intensity.
const BRAIN_THRESHOLD: u8 = 10;
/// Fluid-filled ventricles sit below this intensity inside the brain mask.
const VENTRICLE_THRESHOLD: u8 = 40;
/// Hypointense lesion candidates sit below this intensity.
const LESION_LOW_THRESHOLD: u8 = 60;
/// White matter candidates sit above this intensity.
const WHITE_MATTER_THRESHOLD: u8 = 100;
/// Skull and calcifications sit above this intensity.
const BRIGHT_THRESHOLD: u8 = 180;
/// Sobel gradient magnitude above which a pixel counts as an edge.
const EDGE_MAGNITUDE: f64 = 100.0;

/// Erosions taken off the brain mask to isolate the cortical band.
const CORTICAL_BAND_EROSIONS: usize = 3;
/// Erosions taken off the white-matter mask to isolate its interior.
const WHITE_MATTER_EROSIONS: usize = 2;

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract the full feature vector for a scan. Deterministic: identical
/// input yields an identical vector.
pub fn extract(scan: &ScanImage) -> FeatureVector {
    let normalized = adaptive_equalize(scan.pixels());
    let img = gaussian_blur(&normalized);

    let mut features = FeatureVector::zeroed();

    // Brain segmentation: global threshold + closing to fill small holes
    let brain_mask = close(&threshold_above(&img, BRAIN_THRESHOLD));
    let brain_area = mask_area(&brain_mask);
    if brain_area == 0 {
        log::warn!("empty brain mask; mask-dependent features default to 0");
    }

    // Ventricles: low-intensity pixels inside the brain, speckle removed
    if brain_area > 0 {
        let ventricle_mask = open(&mask_and(&threshold_below(&img, VENTRICLE_THRESHOLD), &brain_mask));
        features.ventricle_ratio = mask_area(&ventricle_mask) as f64 / brain_area as f64 * 100.0;
    }

    // Cortical atrophy proxy: edge density inside the eroded cortical band,
    // normalized by brain size
    if brain_area > 0 {
        let edges = sobel_edges(&img, EDGE_MAGNITUDE);
        let band = erode(&brain_mask, CORTICAL_BAND_EROSIONS);
        let edge_px = mask_area(&mask_and(&edges, &band));
        features.sulci_width = edge_px as f64 / (brain_area as f64).sqrt() * 10.0;
    }

    features.symmetry_score = symmetry_score(&img);
    features.gray_white_ratio = gray_white_ratio(&img, &brain_mask);
    features.white_matter_lesion_pct = lesion_pct(&img);
    features.temporal_atrophy = temporal_atrophy(&img, &brain_mask);

    // Whole-image statistics
    let total = img.len() as f64;
    let mean = img.iter().map(|&v| v as f64).sum::<f64>() / total;
    let var = img.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / total;
    features.mean_intensity = mean;
    features.std_intensity = var.sqrt();
    features.bright_ratio = mask_area(&threshold_above(&img, BRIGHT_THRESHOLD)) as f64 / total;
    features.histogram = normalized_histogram(&img);

    log::debug!(
        "extracted features: ventricle={:.2}% sulci={:.2} symmetry={:.3}",
        features.ventricle_ratio,
        features.sulci_width,
        features.symmetry_score
    );

    features
}

// ============================================================================
// INDIVIDUAL MEASUREMENTS
// ============================================================================

/// 1 minus the mean left/right mirror difference, normalized by the image
/// intensity range. A flat image is perfectly symmetric.
fn symmetry_score(img: &Array2<u8>) -> f64 {
    let (h, w) = img.dim();
    let mid = w / 2;
    if mid == 0 {
        return 1.0;
    }

    let min = img.iter().copied().min().unwrap_or(0) as f64;
    let max = img.iter().copied().max().unwrap_or(0) as f64;
    let range = max - min;
    if range <= 0.0 {
        return 1.0;
    }

    let mut sum = 0.0f64;
    for y in 0..h {
        for x in 0..mid {
            let left = img[[y, x]] as f64;
            let right = img[[y, w - 1 - x]] as f64;
            sum += (left - right).abs() / range;
        }
    }
    let mean_diff = sum / (h * mid) as f64;
    (1.0 - mean_diff).clamp(0.0, 1.0)
}

/// Otsu split of the brain mask into bright and dark submasks; ratio of
/// their mean intensities. 0 is the degenerate sentinel (no measurement).
fn gray_white_ratio(img: &Array2<u8>, brain_mask: &super::ops::Mask) -> f64 {
    let t = match otsu_threshold(img, brain_mask) {
        Some(t) => t,
        None => return 0.0,
    };
    let bright = mask_and(&threshold_above(img, t), brain_mask);
    let mut dark = brain_mask.clone();
    dark.zip_mut_with(&bright, |d, &b| *d = *d && !b);

    match (masked_mean(img, &bright), masked_mean(img, &dark)) {
        (Some(bright_mean), Some(dark_mean)) if dark_mean > 0.0 => bright_mean / dark_mean,
        _ => 0.0,
    }
}

/// Hypointense patches inside the eroded white-matter mask, as a percent of
/// that mask's area.
fn lesion_pct(img: &Array2<u8>) -> f64 {
    let inner_white = erode(&threshold_above(img, WHITE_MATTER_THRESHOLD), WHITE_MATTER_EROSIONS);
    let inner_area = mask_area(&inner_white);
    if inner_area == 0 {
        return 0.0;
    }
    let lesions = mask_and(&threshold_below(img, LESION_LOW_THRESHOLD), &inner_white);
    mask_area(&lesions) as f64 / inner_area as f64 * 100.0
}

/// Darkness of the fixed temporal sub-region (rows 60-80%, cols 30-70%)
/// relative to whole-brain darkness. 0 is the degenerate sentinel.
fn temporal_atrophy(img: &Array2<u8>, brain_mask: &super::ops::Mask) -> f64 {
    let (h, w) = img.dim();
    let (y0, y1) = (h * 6 / 10, h * 8 / 10);
    let (x0, x1) = (w * 3 / 10, w * 7 / 10);
    if y1 <= y0 || x1 <= x0 {
        return 0.0;
    }

    let brain_mean = match masked_mean(img, brain_mask) {
        Some(m) => m,
        None => return 0.0,
    };
    let overall_darkness = 255.0 - brain_mean;
    if overall_darkness <= 0.0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += img[[y, x]] as f64;
        }
    }
    let region_mean = sum / ((y1 - y0) * (x1 - x0)) as f64;
    (255.0 - region_mean) / overall_darkness
}
