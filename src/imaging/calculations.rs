//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{BoundingBox, Orientation};

/// Calculate the power-of-two sample size for a bounded decode.
///
/// The result is the largest power of two such that decoding at that
/// reduction still yields a raster at least as large as the box on every
/// constrained axis. Final precise scaling happens afterwards, so the decode
/// never undershoots the target.
///
/// # Arguments
/// * `source` - Native dimensions (width, height), already oriented
/// * `target` - Requested bounding box (0 = unconstrained axis)
///
/// # Examples
/// ```
/// # use photo_picker::imaging::{calculate_sample_size, BoundingBox};
/// // 4000x3000 into 500x500 → decode at 1/4 (1000x750), not 1/8 (500x375)
/// assert_eq!(calculate_sample_size((4000, 3000), BoundingBox::new(500, 500)), 4);
///
/// // Unconstrained → full resolution
/// assert_eq!(calculate_sample_size((4000, 3000), BoundingBox::new(0, 0)), 1);
/// ```
pub fn calculate_sample_size(source: (u32, u32), target: BoundingBox) -> u32 {
    let (width, height) = source;
    let (req_w, req_h) = (target.width, target.height);
    let mut sample = 1u32;

    if target.is_unconstrained() {
        return sample;
    }

    if (req_h > 0 && height > req_h) || (req_w > 0 && width > req_w) {
        let half_w = width / 2;
        let half_h = height / 2;

        while half_h / sample >= req_h && half_w / sample >= req_w {
            match sample.checked_mul(2) {
                Some(next) => sample = next,
                None => break,
            }
        }
    }

    sample
}

/// Dimensions produced by decoding at a given sample size.
pub fn sampled_dimensions(source: (u32, u32), sample_size: u32) -> (u32, u32) {
    let s = sample_size.max(1);
    ((source.0 / s).max(1), (source.1 / s).max(1))
}

/// Dimensions after applying an orientation transform.
pub fn oriented_dimensions(source: (u32, u32), orientation: Orientation) -> (u32, u32) {
    if orientation.swaps_axes() {
        (source.1, source.0)
    } else {
        source
    }
}

/// Box to compare against the *stored* (pre-orientation) raster.
///
/// A 90° rotated photo's stored width becomes its displayed height, so the
/// requested box is transposed before sampling.
pub fn stored_target(target: BoundingBox, orientation: Orientation) -> BoundingBox {
    if orientation.swaps_axes() {
        BoundingBox::new(target.height, target.width)
    } else {
        target
    }
}

/// Calculate the dimensions that fit inside a bounding box.
///
/// Uses a single uniform scale factor `min(boxW / w, boxH / h)`, capped at
/// 1.0 so images are never upscaled. Unconstrained axes (0) don't limit the
/// factor. Returns `None` when no resize is needed.
///
/// # Examples
/// ```
/// # use photo_picker::imaging::{calculate_fit_dimensions, BoundingBox};
/// assert_eq!(calculate_fit_dimensions((800, 600), BoundingBox::new(100, 100)), Some((100, 75)));
/// assert_eq!(calculate_fit_dimensions((80, 60), BoundingBox::new(100, 100)), None);
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), target: BoundingBox) -> Option<(u32, u32)> {
    let (width, height) = source;
    if width == 0 || height == 0 {
        return None;
    }

    let mut scale = 1.0f64;
    if target.width > 0 && width > target.width {
        scale = target.width as f64 / width as f64;
    }
    if target.height > 0 && height > target.height {
        scale = scale.min(target.height as f64 / height as f64);
    }

    if scale >= 1.0 {
        return None;
    }

    let mut out_w = ((width as f64 * scale).round() as u32).max(1);
    let mut out_h = ((height as f64 * scale).round() as u32).max(1);
    if target.width > 0 {
        out_w = out_w.min(target.width);
    }
    if target.height > 0 {
        out_h = out_h.min(target.height);
    }

    Some((out_w, out_h))
}
