//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the pixel operations the transform
//! engine needs: identify, read_orientation, decode, resize and encode.
//! Every operation works on in-memory bytes, never on a path, because a
//! [`MediaReference`](crate::media::MediaReference) may be revoked by the
//! platform at any time; the engine reads it once and works from the copy.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust on top of
//! the `image` crate.

use super::params::{DecodeParams, EncodedImage, Orientation, Quality};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Resource limit: {0}")]
    ResourceLimit(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// Implementations must be `Send + Sync`: the orchestrator runs the
/// transform pass on the rayon pool.
pub trait ImageBackend: Send + Sync {
    /// Native pixel dimensions, read from the header only.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Embedded orientation metadata.
    ///
    /// Callers treat an error the same as [`Orientation::Normal`].
    fn read_orientation(&self, bytes: &[u8]) -> Result<Orientation, BackendError>;

    /// Decode to a raster, reduced by `params.sample_size`.
    fn decode(&self, bytes: &[u8], params: &DecodeParams) -> Result<DynamicImage, BackendError>;

    /// Resize to exact dimensions (aspect ratio already computed by the caller).
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Encode as a lossy JPEG at the given quality.
    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<EncodedImage, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that records operations and fakes the pixel work.
    ///
    /// Sources are keyed by their byte content; unknown bytes fail identify,
    /// which lets tests script "this reference fails to decode". Uses Mutex
    /// (not RefCell) so it is Sync and works with rayon.
    #[derive(Default)]
    pub struct MockBackend {
        pub sources: Mutex<HashMap<Vec<u8>, (Dimensions, Orientation)>>,
        pub fail_encode: Mutex<bool>,
        pub encode_budget: Mutex<Option<usize>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify,
        ReadOrientation,
        Decode { sample_size: u32 },
        Resize { width: u32, height: u32 },
        Encode { width: u32, height: u32, quality: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a fake source: `bytes` will identify as `width`x`height`.
        pub fn with_source(self, bytes: &[u8], width: u32, height: u32) -> Self {
            self.with_oriented_source(bytes, width, height, Orientation::Normal)
        }

        pub fn with_oriented_source(
            self,
            bytes: &[u8],
            width: u32,
            height: u32,
            orientation: Orientation,
        ) -> Self {
            self.sources
                .lock()
                .unwrap()
                .insert(bytes.to_vec(), (Dimensions { width, height }, orientation));
            self
        }

        pub fn failing_encode(self) -> Self {
            *self.fail_encode.lock().unwrap() = true;
            self
        }

        /// The first `n` encodes succeed, later ones fail.
        pub fn failing_encode_after(self, n: usize) -> Self {
            *self.encode_budget.lock().unwrap() = Some(n);
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn lookup(&self, bytes: &[u8]) -> Result<(Dimensions, Orientation), BackendError> {
            self.sources
                .lock()
                .unwrap()
                .get(bytes)
                .copied()
                .ok_or_else(|| BackendError::Decode("No mock source".to_string()))
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Identify);
            self.lookup(bytes).map(|(dims, _)| dims)
        }

        fn read_orientation(&self, bytes: &[u8]) -> Result<Orientation, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::ReadOrientation);
            self.lookup(bytes).map(|(_, orientation)| orientation)
        }

        fn decode(
            &self,
            bytes: &[u8],
            params: &DecodeParams,
        ) -> Result<DynamicImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Decode {
                sample_size: params.sample_size,
            });
            let (dims, _) = self.lookup(bytes)?;
            let s = params.sample_size.max(1);
            Ok(DynamicImage::new_rgb8(
                (dims.width / s).max(1),
                (dims.height / s).max(1),
            ))
        }

        fn resize(&self, _image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Resize { width, height });
            DynamicImage::new_rgb8(width, height)
        }

        fn encode(
            &self,
            image: &DynamicImage,
            quality: Quality,
        ) -> Result<EncodedImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: image.width(),
                height: image.height(),
                quality: quality.value(),
            });
            let encodes = self
                .get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Encode { .. }))
                .count();
            let over_budget = self.encode_budget.lock().unwrap().is_some_and(|n| encodes > n);
            if *self.fail_encode.lock().unwrap() || over_budget {
                return Err(BackendError::Encode("mock encode failure".to_string()));
            }
            Ok(EncodedImage {
                bytes: b"mock-jpeg".to_vec(),
                width: image.width(),
                height: image.height(),
            })
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::new().with_source(b"a", 800, 600);

        let result = backend.identify(b"a").unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify]);
    }

    #[test]
    fn mock_unknown_source_fails() {
        let backend = MockBackend::new();
        assert!(matches!(backend.identify(b"nope"), Err(BackendError::Decode(_))));
    }

    #[test]
    fn mock_decode_applies_sample_size() {
        let backend = MockBackend::new().with_source(b"a", 800, 600);
        let img = backend
            .decode(b"a", &DecodeParams { sample_size: 4 })
            .unwrap();
        assert_eq!((img.width(), img.height()), (200, 150));
    }
}
