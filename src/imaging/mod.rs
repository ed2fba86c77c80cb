//! Image Transform Engine, pure Rust on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` (header only) |
//! | **Orientation** | `ImageDecoder::orientation` + rotate/flip |
//! | **Bounded decode** | power-of-two sample size, checked against a pixel ceiling |
//! | **Scale** | `resize_exact` to the fitted box |
//! | **Encode** | `JpegEncoder::new_with_quality` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Orientation**: EXIF orientation applied to a decoded raster
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod orientation;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    calculate_fit_dimensions, calculate_sample_size, oriented_dimensions, sampled_dimensions,
    stored_target,
};
pub use operations::{
    TransformContext, TransformError, TransformPlan, plan_transform, render, transform,
    transform_all,
};
pub use orientation::apply_orientation;
pub use params::{BoundingBox, DecodeParams, EncodedImage, Orientation, Quality};
pub use rust_backend::{DEFAULT_MAX_DECODED_PIXELS, RustBackend};
