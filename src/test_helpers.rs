//! Shared test utilities for the photo-picker test suite.
//!
//! Provides synthetic image fixtures (JPEG with and without EXIF orientation,
//! PNG) and a file-backed selection fixture. Everything is generated in
//! memory or under a `TempDir`, so tests need no checked-in assets.

use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::media::MediaReference;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// A valid baseline JPEG with the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// A valid PNG with the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// A JPEG carrying an EXIF APP1 segment with the given orientation tag.
///
/// The segment is a minimal big-endian TIFF block with a single IFD0 entry
/// (`0x0112`, SHORT, count 1), spliced in right after SOI.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let jpeg = jpeg_bytes(width, height);

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&1u16.to_be_bytes());
    tiff.extend_from_slice(&0x0112u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_be_bytes());

    let mut payload = b"Exif\x00\x00".to_vec();
    payload.extend_from_slice(&tiff);

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

// =========================================================================
// File-backed selections
// =========================================================================

/// Write `bytes` to `dir/name` and return a `file://` reference to it.
pub fn write_source(dir: &Path, name: &str, bytes: &[u8]) -> MediaReference {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    MediaReference::from_path(&path)
}

/// A temp directory holding sources plus a separate cache root.
pub struct Fixture {
    pub tmp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("sources")).unwrap();
        Self { tmp }
    }

    pub fn sources(&self) -> PathBuf {
        self.tmp.path().join("sources")
    }

    pub fn cache_root(&self) -> PathBuf {
        self.tmp.path().join("cache")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.tmp.path().join("state")
    }

    pub fn source(&self, name: &str, bytes: &[u8]) -> MediaReference {
        write_source(&self.sources(), name, bytes)
    }
}
