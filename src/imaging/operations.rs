//! High-level transform operations.
//!
//! These functions combine calculations with backend execution. Per
//! selected reference:
//!
//! 1. read the bytes once (the reference may be revoked later),
//! 2. identify + read orientation, pick a sample size, decode,
//! 3. orient upright,
//! 4. scale into the bounding box,
//! 5. encode to JPEG and deliver inline or via the private cache,
//! 6. optionally repeat 2–5 for the thumbnail box.
//!
//! A failure in steps 1–5 drops the reference. A thumbnail failure only
//! drops the thumbnail.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    calculate_fit_dimensions, calculate_sample_size, oriented_dimensions, sampled_dimensions,
    stored_target,
};
use super::orientation::apply_orientation;
use super::params::{BoundingBox, DecodeParams, Orientation, Quality};
use crate::artifact::{ImageArtifact, Payload, RenderedImage, ResultSet};
use crate::cache::{ArtifactCache, CacheError, file_uri};
use crate::config::FailurePolicy;
use crate::media::{MediaError, MediaReference, MediaResolver};
use crate::request::{OutputMode, PickRequest};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use thiserror::Error;

/// Why one reference was dropped.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Read failed: {0}")]
    Read(#[from] MediaError),
    #[error("Decode failed: {0}")]
    Decode(#[source] BackendError),
    #[error("Encode failed: {0}")]
    Encode(#[source] BackendError),
    #[error("Write failed: {0}")]
    Write(#[from] CacheError),
}

impl TransformError {
    /// Pipeline stage name used in log entries.
    pub fn stage(&self) -> &'static str {
        match self {
            TransformError::Read(_) => "read",
            TransformError::Decode(_) => "decode",
            TransformError::Encode(_) => "encode",
            TransformError::Write(_) => "write",
        }
    }
}

/// Everything the engine needs besides the request.
pub struct TransformContext<'a, B: ImageBackend + ?Sized, R: MediaResolver + ?Sized> {
    pub backend: &'a B,
    pub resolver: &'a R,
    pub cache: &'a ArtifactCache,
}

/// Planned decode for one source, computed before any pixels are touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformPlan {
    pub orientation: Orientation,
    pub decode: DecodeParams,
    /// Upright dimensions right after the sampled decode.
    pub decoded: (u32, u32),
    /// Final output dimensions, or `None` when no resize happens.
    pub resize_to: Option<(u32, u32)>,
}

/// Plan a transform without executing it.
///
/// `native` is the stored (pre-orientation) size from the header. The box
/// applies to the upright image, so it is transposed for quarter turns
/// before choosing the sample size.
pub fn plan_transform(
    native: (u32, u32),
    orientation: Orientation,
    bounds: BoundingBox,
) -> TransformPlan {
    let sample_size = calculate_sample_size(native, stored_target(bounds, orientation));
    let decoded = oriented_dimensions(sampled_dimensions(native, sample_size), orientation);

    TransformPlan {
        orientation,
        decode: DecodeParams { sample_size },
        decoded,
        resize_to: calculate_fit_dimensions(decoded, bounds),
    }
}

/// Steps 2–5 for one bounding box: decode, orient, scale, encode, deliver.
pub fn render(
    backend: &(impl ImageBackend + ?Sized),
    cache: &ArtifactCache,
    bytes: &[u8],
    bounds: BoundingBox,
    quality: Quality,
    mode: OutputMode,
) -> Result<RenderedImage, TransformError> {
    let native = backend.identify(bytes).map_err(TransformError::Decode)?;
    let orientation = backend.read_orientation(bytes).unwrap_or_else(|e| {
        log::debug!("orientation unreadable, treating as upright: {}", e);
        Orientation::Normal
    });
    let plan = plan_transform(native.as_tuple(), orientation, bounds);

    let decoded = backend
        .decode(bytes, &plan.decode)
        .map_err(TransformError::Decode)?;
    let upright = apply_orientation(decoded, plan.orientation);

    // Fit against the actual raster; a backend may round the sampled size differently.
    let scaled = match calculate_fit_dimensions((upright.width(), upright.height()), bounds) {
        Some((width, height)) => backend.resize(&upright, width, height),
        None => upright,
    };

    let encoded = backend
        .encode(&scaled, quality)
        .map_err(TransformError::Encode)?;
    let byte_len = encoded.bytes.len() as u64;

    let payload = match mode {
        OutputMode::InlineEncoded => Payload::Inline(STANDARD.encode(&encoded.bytes)),
        OutputMode::FileReference => {
            let path = cache.write(&encoded.bytes)?;
            let uri = file_uri(&path)?;
            Payload::File { path, uri }
        }
    };

    Ok(RenderedImage {
        payload,
        width: encoded.width,
        height: encoded.height,
        byte_len,
    })
}

/// Transform one selected reference into an artifact.
pub fn transform<B, R>(
    ctx: &TransformContext<'_, B, R>,
    reference: &MediaReference,
    request: &PickRequest,
) -> Result<ImageArtifact, TransformError>
where
    B: ImageBackend + ?Sized,
    R: MediaResolver + ?Sized,
{
    let bytes = ctx.resolver.read(reference)?;

    let image = render(
        ctx.backend,
        ctx.cache,
        &bytes,
        request.bounds,
        request.quality,
        request.output_mode,
    )?;

    let thumbnail = if request.include_thumbnail {
        render(
            ctx.backend,
            ctx.cache,
            &bytes,
            request.thumbnail_bounds,
            request.quality,
            request.output_mode,
        )
        .map_err(|e| {
            log::debug!("thumbnail omitted for {} ({}): {}", reference, e.stage(), e);
        })
        .ok()
    } else {
        None
    };

    Ok(ImageArtifact {
        source: reference.clone(),
        file_name: ctx.resolver.display_name(reference),
        image,
        thumbnail,
    })
}

/// Transform a whole selection in parallel, keeping selection order.
///
/// Failed references are dropped positionally; each drop is logged per
/// `policy`.
pub fn transform_all<B, R>(
    ctx: &TransformContext<'_, B, R>,
    references: &[MediaReference],
    request: &PickRequest,
    policy: FailurePolicy,
) -> ResultSet
where
    B: ImageBackend + ?Sized,
    R: MediaResolver + ?Sized,
{
    let artifacts: Vec<ImageArtifact> = references
        .par_iter()
        .map(|reference| {
            transform(ctx, reference, request)
                .map_err(|e| {
                    if policy == FailurePolicy::Log {
                        log::warn!(
                            "dropping image reference={} stage={} error={}",
                            reference,
                            e.stage(),
                            e
                        );
                    }
                })
                .ok()
        })
        .collect::<Vec<Option<ImageArtifact>>>()
        .into_iter()
        .flatten()
        .collect();

    ResultSet::new(artifacts)
}
