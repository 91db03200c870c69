//! Pixel-level primitives for feature extraction
//!
//! Pure functions over `Array2` pixels and boolean masks. Each mirrors the
//! classical operation it is named after; all are deterministic.

use ndarray::Array2;

/// Boolean pixel mask with the same shape as its source image.
pub type Mask = Array2<bool>;

// ============================================================================
// CONTRAST NORMALIZATION
// ============================================================================

/// Tile grid used for adaptive contrast normalization.
pub const CLAHE_GRID: usize = 8;
/// Histogram clip limit, as a multiple of the uniform bin height.
pub const CLAHE_CLIP_LIMIT: f64 = 2.0;

/// Adaptive local contrast normalization: per-tile clipped histogram
/// equalization over an 8x8 grid. Clipping keeps near-uniform tiles close
/// to identity instead of blowing them out to full range.
pub fn adaptive_equalize(img: &Array2<u8>) -> Array2<u8> {
    let (h, w) = img.dim();
    let tile_h = (h + CLAHE_GRID - 1) / CLAHE_GRID;
    let tile_w = (w + CLAHE_GRID - 1) / CLAHE_GRID;
    let mut out = Array2::<u8>::zeros((h, w));

    for ty in (0..h).step_by(tile_h.max(1)) {
        for tx in (0..w).step_by(tile_w.max(1)) {
            let y_end = (ty + tile_h).min(h);
            let x_end = (tx + tile_w).min(w);
            let n = ((y_end - ty) * (x_end - tx)) as u64;
            if n == 0 {
                continue;
            }

            let mut hist = [0.0f64; 256];
            for y in ty..y_end {
                for x in tx..x_end {
                    hist[img[[y, x]] as usize] += 1.0;
                }
            }

            // Clip and redistribute the excess uniformly
            let clip = (CLAHE_CLIP_LIMIT * n as f64 / 256.0).max(1.0);
            let mut excess = 0.0f64;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let share = excess / 256.0;
            for bin in hist.iter_mut() {
                *bin += share;
            }

            // Build the equalization LUT from the clipped CDF
            let mut lut = [0u8; 256];
            let mut cdf = 0.0f64;
            for (v, bin) in hist.iter().enumerate() {
                cdf += *bin;
                lut[v] = (cdf * 255.0 / n as f64).round().min(255.0) as u8;
            }

            for y in ty..y_end {
                for x in tx..x_end {
                    out[[y, x]] = lut[img[[y, x]] as usize];
                }
            }
        }
    }

    out
}

// ============================================================================
// SMOOTHING
// ============================================================================

/// 3x3 Gaussian blur (1-2-1 separable kernel), borders clamped.
pub fn gaussian_blur(img: &Array2<u8>) -> Array2<u8> {
    let (h, w) = img.dim();
    let clamp = |v: isize, max: usize| v.clamp(0, max as isize - 1) as usize;

    // Horizontal pass
    let mut tmp = Array2::<u16>::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let xi = x as isize;
            let sum = img[[y, clamp(xi - 1, w)]] as u16
                + 2 * img[[y, x]] as u16
                + img[[y, clamp(xi + 1, w)]] as u16;
            tmp[[y, x]] = sum;
        }
    }

    // Vertical pass, then normalize by 16
    let mut out = Array2::<u8>::zeros((h, w));
    for y in 0..h {
        let yi = y as isize;
        for x in 0..w {
            let sum = tmp[[clamp(yi - 1, h), x]] as u32
                + 2 * tmp[[y, x]] as u32
                + tmp[[clamp(yi + 1, h), x]] as u32;
            out[[y, x]] = ((sum + 8) / 16).min(255) as u8;
        }
    }
    out
}

// ============================================================================
// THRESHOLD MASKS
// ============================================================================

/// Pixels strictly above the threshold.
pub fn threshold_above(img: &Array2<u8>, threshold: u8) -> Mask {
    img.map(|&v| v > threshold)
}

/// Pixels strictly below the threshold.
pub fn threshold_below(img: &Array2<u8>, threshold: u8) -> Mask {
    img.map(|&v| v < threshold)
}

/// Intersection of two masks.
pub fn mask_and(a: &Mask, b: &Mask) -> Mask {
    let mut out = a.clone();
    out.zip_mut_with(b, |x, &y| *x = *x && y);
    out
}

/// Number of set pixels.
pub fn mask_area(mask: &Mask) -> usize {
    mask.iter().filter(|&&v| v).count()
}

// ============================================================================
// MORPHOLOGY (5x5 square structuring element)
// ============================================================================

const KERNEL_RADIUS: isize = 2;

fn morph_pass(mask: &Mask, erode: bool) -> Mask {
    let (h, w) = mask.dim();
    let mut out = Mask::from_elem((h, w), erode);
    for y in 0..h {
        for x in 0..w {
            let mut acc = erode;
            'scan: for dy in -KERNEL_RADIUS..=KERNEL_RADIUS {
                for dx in -KERNEL_RADIUS..=KERNEL_RADIUS {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;
                    if ny < 0 || nx < 0 || ny >= h as isize || nx >= w as isize {
                        continue;
                    }
                    let v = mask[[ny as usize, nx as usize]];
                    if erode && !v {
                        acc = false;
                        break 'scan;
                    }
                    if !erode && v {
                        acc = true;
                        break 'scan;
                    }
                }
            }
            out[[y, x]] = acc;
        }
    }
    out
}

/// Morphological erosion, `iterations` passes of a 5x5 kernel.
pub fn erode(mask: &Mask, iterations: usize) -> Mask {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = morph_pass(&out, true);
    }
    out
}

/// Morphological dilation, `iterations` passes of a 5x5 kernel.
pub fn dilate(mask: &Mask, iterations: usize) -> Mask {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = morph_pass(&out, false);
    }
    out
}

/// Opening: erosion then dilation. Removes speckle noise.
pub fn open(mask: &Mask) -> Mask {
    dilate(&erode(mask, 1), 1)
}

/// Closing: dilation then erosion. Fills small holes.
pub fn close(mask: &Mask) -> Mask {
    erode(&dilate(mask, 1), 1)
}

// ============================================================================
// EDGES
// ============================================================================

/// Sobel gradient-magnitude edge detection. Border pixels are never edges.
pub fn sobel_edges(img: &Array2<u8>, magnitude_threshold: f64) -> Mask {
    let (h, w) = img.dim();
    let mut out = Mask::from_elem((h, w), false);
    if h < 3 || w < 3 {
        return out;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p = |dy: usize, dx: usize| img[[y + dy - 1, x + dx - 1]] as i32;
            let gx = -p(0, 0) + p(0, 2) - 2 * p(1, 0) + 2 * p(1, 2) - p(2, 0) + p(2, 2);
            let gy = -p(0, 0) - 2 * p(0, 1) - p(0, 2) + p(2, 0) + 2 * p(2, 1) + p(2, 2);
            let mag = ((gx * gx + gy * gy) as f64).sqrt();
            out[[y, x]] = mag > magnitude_threshold;
        }
    }
    out
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Mean intensity under a mask, `None` when the mask is empty.
pub fn masked_mean(img: &Array2<u8>, mask: &Mask) -> Option<f64> {
    let mut sum = 0u64;
    let mut count = 0u64;
    for (v, m) in img.iter().zip(mask.iter()) {
        if *m {
            sum += *v as u64;
            count += 1;
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

/// Otsu's threshold over pixels under a mask, `None` when the mask is empty
/// or uniform. Splits the masked region into dark and bright submasks.
pub fn otsu_threshold(img: &Array2<u8>, mask: &Mask) -> Option<u8> {
    let mut hist = [0u64; 256];
    let mut total = 0u64;
    for (v, m) in img.iter().zip(mask.iter()) {
        if *m {
            hist[*v as usize] += 1;
            total += 1;
        }
    }
    if total == 0 {
        return None;
    }

    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum();

    let mut best_t = None;
    let mut best_var = 0.0f64;
    let mut w0 = 0u64;
    let mut sum0 = 0.0f64;
    for t in 0..255usize {
        w0 += hist[t];
        sum0 += t as f64 * hist[t] as f64;
        if w0 == 0 {
            continue;
        }
        let w1 = total - w0;
        if w1 == 0 {
            break;
        }
        let mean0 = sum0 / w0 as f64;
        let mean1 = (sum_all - sum0) / w1 as f64;
        let between = w0 as f64 * w1 as f64 * (mean0 - mean1) * (mean0 - mean1);
        if between > best_var {
            best_var = between;
            best_t = Some(t as u8);
        }
    }
    best_t
}

/// Normalized 256-bin intensity histogram over the whole image.
pub fn normalized_histogram(img: &Array2<u8>) -> Vec<f64> {
    let mut hist = vec![0.0f64; 256];
    let total = img.len() as f64;
    if total == 0.0 {
        return hist;
    }
    for &v in img.iter() {
        hist[v as usize] += 1.0;
    }
    for bin in hist.iter_mut() {
        *bin /= total;
    }
    hist
}

// ============================================================================
// TESTS
// ============================================================================
