//! Orientation correction for decoded rasters.
//!
//! Maps the eight EXIF orientations onto `image`'s rotate/flip primitives.
//! `rotate90` in the `image` crate is clockwise.

use super::params::Orientation;
use image::DynamicImage;

/// Apply an orientation so the raster is visually upright.
///
/// [`Orientation::Normal`] returns the input untouched.
pub fn apply_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => image,
        Orientation::FlipHorizontal => image.fliph(),
        Orientation::Rotate180 => image.rotate180(),
        Orientation::FlipVertical => image.flipv(),
        Orientation::Transpose => image.rotate90().fliph(),
        Orientation::Rotate90 => image.rotate90(),
        Orientation::Transverse => image.rotate270().fliph(),
        Orientation::Rotate270 => image.rotate270(),
    }
}
