//! Aspect ratio classification
//!
//! Pure functions for ratio simplification, decimal aspect, nearest standard
//! ratio lookup and the size estimates shown on property nodes.

use crate::constants::metrics::{
    BYTES_PER_MB, PIXELS_PER_MEGAPIXEL, STANDARD_RATIO_TOLERANCE, TENSOR_BYTES_PER_ELEMENT,
    TENSOR_CHANNELS,
};

/// A canonical width:height ratio with its display label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardRatio {
    pub value: f64,
    pub label: &'static str,
}

impl StandardRatio {
    const fn new(value: f64, label: &'static str) -> Self {
        Self { value, label }
    }
}

/// Ordered lookup table; earlier entries win ties.
pub const STANDARD_RATIOS: [StandardRatio; 13] = [
    StandardRatio::new(1.0, "1:1"),
    StandardRatio::new(1.25, "5:4"),
    StandardRatio::new(1.33333, "4:3"),
    StandardRatio::new(1.5, "3:2"),
    StandardRatio::new(1.6, "16:10"),
    StandardRatio::new(1.66667, "5:3"),
    StandardRatio::new(1.77778, "16:9"),
    StandardRatio::new(1.88889, "17:9"),
    StandardRatio::new(2.0, "2:1"),
    StandardRatio::new(2.33333, "21:9"),
    StandardRatio::new(2.35, "2.35:1"),
    StandardRatio::new(2.39, "2.39:1"),
    StandardRatio::new(2.4, "12:5"),
];

/// Greatest common divisor (Euclid). `gcd(a, 0) == a`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Reduce `width:height` to lowest terms
pub fn simplify_ratio(width: u32, height: u32) -> (u64, u64) {
    let (w, h) = (u64::from(width), u64::from(height));
    let divisor = gcd(w, h);
    if divisor == 0 {
        return (w, h);
    }
    (w / divisor, h / divisor)
}

/// Unrounded `width / height`
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    f64::from(width) / f64::from(height)
}

/// Closest table entry to `aspect`, or `None` when even the closest is further than the tolerance
pub fn nearest_standard_ratio_for(aspect: f64) -> Option<&'static StandardRatio> {
    let mut closest: Option<&'static StandardRatio> = None;
    let mut closest_diff = f64::INFINITY;

    for candidate in STANDARD_RATIOS.iter() {
        let diff = (candidate.value - aspect).abs();
        if diff < closest_diff {
            closest_diff = diff;
            closest = Some(candidate);
        }
    }

    if closest_diff > STANDARD_RATIO_TOLERANCE {
        return None;
    }
    closest
}

/// Closest standard ratio label for an image of the given size
pub fn nearest_standard_ratio(width: u32, height: u32) -> Option<&'static str> {
    nearest_standard_ratio_for(aspect_ratio(width, height)).map(|ratio| ratio.label)
}

/// Unrounded megapixels
pub fn megapixels(width: u32, height: u32) -> f64 {
    (u64::from(width) * u64::from(height)) as f64 / PIXELS_PER_MEGAPIXEL
}

/// Estimated in-memory size of one image as a 3-channel float32 tensor, in MB.
///
/// This models that single layout only; it is not the memory used by
/// arbitrary tensor layouts.
pub fn estimated_tensor_size_mb(width: u32, height: u32) -> f64 {
    let bytes = u64::from(width) * u64::from(height) * TENSOR_CHANNELS * TENSOR_BYTES_PER_ELEMENT;
    bytes as f64 / BYTES_PER_MB
}

/// Round to two decimals for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
