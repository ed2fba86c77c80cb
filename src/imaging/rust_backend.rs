//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Orientation | `ImageDecoder::orientation` (EXIF, JPEG/TIFF/WebP/PNG) |
//! | Decode JPEG | `jpeg_decoder::Decoder::scale` (1/2, 1/4, 1/8 in the DCT domain) |
//! | Decode PNG, TIFF, WebP | `image` crate decoders under `image::Limits`, then `thumbnail_exact` |
//! | Resize | `DynamicImage::resize_exact` with the configured filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |
//!
//! `max_decoded_pixels` bounds the raster that is actually materialized.
//! For JPEG that is the DCT-scaled size, so a 48 MP photo requested at
//! 200×200 decodes at 1/8 and never needs a 48 MP buffer. The other formats
//! have no reduced decode; their native size is checked against the
//! ceiling before any pixel data is touched.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::sampled_dimensions;
use super::params::{DecodeParams, EncodedImage, Orientation, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{
    DynamicImage, GrayImage, ImageBuffer, ImageDecoder, ImageFormat, ImageReader, Limits, Luma,
    RgbImage,
};
use jpeg_decoder::PixelFormat;
use std::io::Cursor;

/// Default decoded-pixel ceiling (~250 MP, above current phone sensors).
pub const DEFAULT_MAX_DECODED_PIXELS: u64 = 250_000_000;

/// Bytes per pixel budgeted for the decode buffer (8-bit RGBA).
const BYTES_PER_PIXEL: u64 = 4;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    max_decoded_pixels: u64,
    filter: FilterType,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            max_decoded_pixels: DEFAULT_MAX_DECODED_PIXELS,
            filter: FilterType::Triangle,
        }
    }

    pub fn with_limits(max_decoded_pixels: u64, filter: FilterType) -> Self {
        Self {
            max_decoded_pixels,
            filter,
        }
    }

    fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)
    }

    fn max_alloc(&self) -> u64 {
        self.max_decoded_pixels.saturating_mul(BYTES_PER_PIXEL)
    }

    fn validate_pixel_limits(&self, dims: Dimensions) -> Result<(), BackendError> {
        let pixels = (dims.width as u64)
            .checked_mul(dims.height as u64)
            .ok_or_else(|| BackendError::ResourceLimit("pixel count overflow".to_string()))?;

        if pixels > self.max_decoded_pixels {
            return Err(BackendError::ResourceLimit(format!(
                "{}x{} exceeds {} decoded pixels",
                dims.width, dims.height, self.max_decoded_pixels
            )));
        }
        Ok(())
    }

    /// JPEG decode scaled in the DCT domain to the nearest factor that still
    /// covers `target`, then box-sampled down to exactly `target`.
    fn decode_jpeg(&self, bytes: &[u8], sample: u32) -> Result<DynamicImage, BackendError> {
        let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(bytes));
        decoder.set_max_decoding_buffer_size(usize::try_from(self.max_alloc()).unwrap_or(usize::MAX));
        decoder
            .read_info()
            .map_err(|e| BackendError::Decode(format!("Failed to read JPEG header: {}", e)))?;
        let info = decoder
            .info()
            .ok_or_else(|| BackendError::Decode("JPEG header missing".to_string()))?;

        let target = sampled_dimensions((info.width as u32, info.height as u32), sample);
        let (width, height) = decoder
            .scale(clamp_u16(target.0), clamp_u16(target.1))
            .map_err(|e| BackendError::Decode(format!("Unsupported JPEG scale: {}", e)))?;
        let (width, height) = (width as u32, height as u32);
        self.validate_pixel_limits(Dimensions { width, height })?;

        let pixels = decoder
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let raster = jpeg_raster(pixels, width, height, info.pixel_format)?;

        if (raster.width(), raster.height()) == target {
            Ok(raster)
        } else {
            Ok(raster.thumbnail_exact(target.0, target.1))
        }
    }

    fn decode_generic(&self, bytes: &[u8], sample: u32) -> Result<DynamicImage, BackendError> {
        let header = Self::reader(bytes)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {}", e)))?;
        self.validate_pixel_limits(Dimensions {
            width: header.0,
            height: header.1,
        })?;

        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_alloc());
        let mut reader = Self::reader(bytes)?;
        reader.limits(limits);
        let decoded = reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        if sample == 1 {
            return Ok(decoded);
        }
        let (width, height) = sampled_dimensions((decoded.width(), decoded.height()), sample);
        Ok(decoded.thumbnail_exact(width, height))
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Wrap raw `jpeg_decoder` output in a `DynamicImage`.
fn jpeg_raster(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<DynamicImage, BackendError> {
    let short = || BackendError::Decode("JPEG pixel buffer shorter than its header".to_string());
    match format {
        PixelFormat::L8 => GrayImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(short),
        PixelFormat::L16 => {
            let samples = pixels
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, samples)
                .map(DynamicImage::ImageLuma16)
                .ok_or_else(short)
        }
        PixelFormat::RGB24 => RgbImage::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(short),
        PixelFormat::CMYK32 => {
            let rgb = pixels
                .chunks_exact(4)
                .flat_map(|p| {
                    let k = 255 - p[3] as u32;
                    [p[0], p[1], p[2]].map(|c| ((255 - c as u32) * k / 255) as u8)
                })
                .collect();
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(short)
        }
        #[allow(unreachable_patterns)]
        other => Err(BackendError::Decode(format!(
            "Unsupported JPEG pixel format: {:?}",
            other
        ))),
    }
}

fn from_image_orientation(orientation: image::metadata::Orientation) -> Orientation {
    use image::metadata::Orientation as Img;
    match orientation {
        Img::NoTransforms => Orientation::Normal,
        Img::FlipHorizontal => Orientation::FlipHorizontal,
        Img::Rotate180 => Orientation::Rotate180,
        Img::FlipVertical => Orientation::FlipVertical,
        Img::Rotate90FlipH => Orientation::Transpose,
        Img::Rotate90 => Orientation::Rotate90,
        Img::Rotate270FlipH => Orientation::Transverse,
        Img::Rotate270 => Orientation::Rotate270,
        #[allow(unreachable_patterns)]
        _ => Orientation::Normal,
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = Self::reader(bytes)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {}", e)))?;
        Ok(Dimensions { width, height })
    }

    fn read_orientation(&self, bytes: &[u8]) -> Result<Orientation, BackendError> {
        let mut decoder = Self::reader(bytes)?
            .into_decoder()
            .map_err(|e| BackendError::Decode(format!("No decoder: {}", e)))?;
        let orientation = decoder
            .orientation()
            .map_err(|e| BackendError::Decode(format!("Unreadable orientation: {}", e)))?;
        Ok(from_image_orientation(orientation))
    }

    fn decode(&self, bytes: &[u8], params: &DecodeParams) -> Result<DynamicImage, BackendError> {
        let sample = params.sample_size.max(1);
        match Self::reader(bytes)?.format() {
            Some(ImageFormat::Jpeg) => self.decode_jpeg(bytes, sample),
            _ => self.decode_generic(bytes, sample),
        }
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, self.filter)
    }

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<EncodedImage, BackendError> {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut bytes = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.value() as u8);
        rgb.write_with_encoder(encoder)
            .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;

        Ok(EncodedImage {
            bytes,
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, jpeg_with_orientation, png_bytes};

    #[test]
    fn identify_synthetic_jpeg() {
        let backend = RustBackend::new();
        let dims = backend.identify(&jpeg_bytes(200, 150)).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.identify(b"definitely not an image").is_err());
    }

    #[test]
    fn orientation_missing_is_normal() {
        let backend = RustBackend::new();
        let orientation = backend.read_orientation(&jpeg_bytes(40, 30)).unwrap();
        assert_eq!(orientation, Orientation::Normal);
    }

    #[test]
    fn orientation_read_from_exif() {
        let backend = RustBackend::new();
        let bytes = jpeg_with_orientation(40, 30, 6);
        assert_eq!(backend.read_orientation(&bytes).unwrap(), Orientation::Rotate90);
    }

    #[test]
    fn orientation_of_png_without_metadata_is_normal() {
        let backend = RustBackend::new();
        let orientation = backend.read_orientation(&png_bytes(10, 10)).unwrap();
        assert_eq!(orientation, Orientation::Normal);
    }

    #[test]
    fn decode_full_resolution() {
        let backend = RustBackend::new();
        let img = backend
            .decode(&jpeg_bytes(120, 80), &DecodeParams::default())
            .unwrap();
        assert_eq!((img.width(), img.height()), (120, 80));
    }

    #[test]
    fn decode_with_sample_size() {
        let backend = RustBackend::new();
        let img = backend
            .decode(&jpeg_bytes(400, 300), &DecodeParams { sample_size: 4 })
            .unwrap();
        assert_eq!((img.width(), img.height()), (100, 75));
    }

    #[test]
    fn decode_rejects_oversized_header() {
        let backend = RustBackend::with_limits(1_000, FilterType::Triangle);
        let result = backend.decode(&jpeg_bytes(100, 100), &DecodeParams::default());
        assert!(matches!(result, Err(BackendError::ResourceLimit(_))));
    }

    #[test]
    fn jpeg_ceiling_applies_to_sampled_size() {
        // 1.08 MP source, 100k pixel ceiling: only the 1/8 decode fits.
        let backend = RustBackend::with_limits(100_000, FilterType::Triangle);
        let bytes = jpeg_bytes(1200, 900);

        let img = backend
            .decode(&bytes, &DecodeParams { sample_size: 8 })
            .unwrap();
        assert_eq!((img.width(), img.height()), (150, 112));

        let full = backend.decode(&bytes, &DecodeParams::default());
        assert!(matches!(full, Err(BackendError::ResourceLimit(_))));
    }

    #[test]
    fn jpeg_odd_size_matches_sampled_dimensions() {
        let backend = RustBackend::new();
        let img = backend
            .decode(&jpeg_bytes(333, 221), &DecodeParams { sample_size: 2 })
            .unwrap();
        assert_eq!((img.width(), img.height()), (166, 110));
    }

    #[test]
    fn png_ceiling_applies_to_native_size() {
        let backend = RustBackend::with_limits(1_000, FilterType::Triangle);
        let result = backend.decode(&png_bytes(100, 100), &DecodeParams { sample_size: 4 });
        assert!(matches!(result, Err(BackendError::ResourceLimit(_))));
    }

    #[test]
    fn png_sampled_after_decode() {
        let backend = RustBackend::new();
        let img = backend
            .decode(&png_bytes(120, 80), &DecodeParams { sample_size: 2 })
            .unwrap();
        assert_eq!((img.width(), img.height()), (60, 40));
    }

    #[test]
    fn default_ceiling_admits_phone_sensors() {
        // 200 MP sensors ship in current phones.
        assert!(DEFAULT_MAX_DECODED_PIXELS >= 200_000_000);
    }

    #[test]
    fn decode_truncated_jpeg_errors() {
        let backend = RustBackend::new();
        let mut bytes = jpeg_bytes(64, 64);
        bytes.truncate(20);
        assert!(backend.decode(&bytes, &DecodeParams::default()).is_err());
    }

    #[test]
    fn encode_produces_decodable_jpeg() {
        let backend = RustBackend::new();
        let img = DynamicImage::new_rgba8(30, 20);
        let encoded = backend.encode(&img, Quality::new(80)).unwrap();

        assert_eq!((encoded.width, encoded.height), (30, 20));
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&encoded.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn lower_quality_is_smaller() {
        let backend = RustBackend::new();
        let source = backend
            .decode(&jpeg_bytes(256, 256), &DecodeParams::default())
            .unwrap();
        let high = backend.encode(&source, Quality::new(100)).unwrap();
        let low = backend.encode(&source, Quality::new(10)).unwrap();
        assert!(low.bytes.len() < high.bytes.len());
    }

    #[test]
    fn resize_exact_dimensions() {
        let backend = RustBackend::new();
        let img = DynamicImage::new_rgb8(200, 100);
        let out = backend.resize(&img, 50, 25);
        assert_eq!((out.width(), out.height()), (50, 25));
    }
}
