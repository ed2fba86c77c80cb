//! Parameter types for the transform engine.
//!
//! These structs describe *what* to do, not *how*. They sit between
//! [`operations`](super::operations), which plans a transform from a
//! [`PickRequest`](crate::request::PickRequest), and the
//! [`backend`](super::backend), which does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 100). Clamped on construction.
//! - [`BoundingBox`]: maximum output width/height; `0` on an axis means unconstrained.
//! - [`Orientation`]: EXIF orientation tag, normalized to the eight defined values.
//! - [`DecodeParams`]: power-of-two sample size for the bounded decode.
//! - [`EncodedImage`]: encoded bytes plus final pixel dimensions.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Bounding box for a resize. Output never exceeds it; aspect ratio is kept.
///
/// Each axis is independent: `width == 0` leaves width unconstrained while
/// height still bounds the result, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// No constraint on either axis: decode and encode at native size.
    pub fn is_unconstrained(self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// EXIF orientation (tag `0x0112`).
///
/// Values outside 1..=8 are treated as [`Orientation::Normal`], the same as
/// a missing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    /// Flip horizontal, then rotate 270° clockwise.
    Transpose,
    Rotate90,
    /// Flip horizontal, then rotate 90° clockwise.
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    pub fn exif_value(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Whether applying this orientation swaps width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }
}

/// Parameters for the bounded decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    /// Power-of-two reduction applied while decoding (1 = full resolution).
    pub sample_size: u32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self { sample_size: 1 }
    }
}

/// Output of the encode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(80).value(), 80);
        assert_eq!(Quality::new(250).value(), 100);
    }

    #[test]
    fn quality_default_is_100() {
        assert_eq!(Quality::default().value(), 100);
    }

    #[test]
    fn bounding_box_unconstrained_only_when_both_zero() {
        assert!(BoundingBox::new(0, 0).is_unconstrained());
        assert!(!BoundingBox::new(100, 0).is_unconstrained());
        assert!(!BoundingBox::new(0, 100).is_unconstrained());
    }

    #[test]
    fn orientation_exif_values_roundtrip_for_defined_tags() {
        for v in 1..=8 {
            assert_eq!(Orientation::from_exif(v).exif_value(), v);
        }
    }

    #[test]
    fn orientation_out_of_range_is_normal() {
        assert_eq!(Orientation::from_exif(0), Orientation::Normal);
        assert_eq!(Orientation::from_exif(9), Orientation::Normal);
    }

    #[test]
    fn quarter_turns_swap_axes() {
        assert!(Orientation::Rotate90.swaps_axes());
        assert!(Orientation::Rotate270.swaps_axes());
        assert!(Orientation::Transpose.swaps_axes());
        assert!(!Orientation::Rotate180.swaps_axes());
        assert!(!Orientation::FlipHorizontal.swaps_axes());
    }
}
