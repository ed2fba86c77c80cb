//! Transform outputs and the response shapes handed back to the caller.
//!
//! An [`ImageArtifact`] is one fully materialized result: the primary
//! [`RenderedImage`] plus an optional nested thumbnail. A [`ResultSet`]
//! keeps artifacts in selection order and is converted into a
//! [`PickResponse`] at the very end of a pick.
//!
//! ## Response shapes
//!
//! - **Legacy**: `["file:///.../image_<uuid>.jpg", ...]`, one string per
//!   artifact (a `file://` URI or a base64 payload).
//! - **Enhanced**: one record per artifact:
//!
//! ```json
//! {
//!   "originalPath": "file:///cache/photo_picker_images/image_1b4e....jpg",
//!   "fileName": "IMG_0042.jpg",
//!   "fileSize": 48213,
//!   "mimeType": "image/jpeg",
//!   "width": 800,
//!   "height": 600,
//!   "thumbnail": "file:///cache/photo_picker_images/image_9c0d....jpg",
//!   "thumbnailWidth": 200,
//!   "thumbnailHeight": 150,
//!   "contentUri": "content://media/picker/0/42"
//! }
//! ```
//!
//! Which shape is used depends only on the request: `includeThumbnail=false`
//! gives legacy strings, anything else gives enhanced records.

use crate::media::MediaReference;
use crate::request::PickRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MIME type of every encoded artifact.
pub const ARTIFACT_MIME_TYPE: &str = "image/jpeg";

/// Where the encoded bytes ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Written to the private cache.
    File { path: PathBuf, uri: String },
    /// Standard base64, no line wrapping.
    Inline(String),
}

impl Payload {
    /// The string the caller sees: a `file://` URI or the base64 text.
    pub fn as_wire(&self) -> &str {
        match self {
            Payload::File { uri, .. } => uri,
            Payload::Inline(encoded) => encoded,
        }
    }
}

/// One encoded image: payload plus its final pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub payload: Payload,
    pub width: u32,
    pub height: u32,
    /// Encoded length in bytes (before base64).
    pub byte_len: u64,
}

/// Result of transforming one selected reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub source: MediaReference,
    pub file_name: Option<String>,
    pub image: RenderedImage,
    pub thumbnail: Option<RenderedImage>,
}

/// Artifacts in selection order. Failed references are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub artifacts: Vec<ImageArtifact>,
}

impl ResultSet {
    pub fn new(artifacts: Vec<ImageArtifact>) -> Self {
        Self { artifacts }
    }

    /// Result of a cancelled selection: empty, never null.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Package for the caller using the request's shape rule.
    pub fn into_response(self, request: &PickRequest) -> PickResponse {
        match ResponseShape::for_request(request) {
            ResponseShape::Legacy => PickResponse::Legacy(
                self.artifacts
                    .into_iter()
                    .map(|a| a.image.payload.as_wire().to_string())
                    .collect(),
            ),
            ResponseShape::Enhanced => PickResponse::Enhanced(
                self.artifacts.into_iter().map(ArtifactRecord::from).collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Legacy,
    Enhanced,
}

impl ResponseShape {
    pub fn for_request(request: &PickRequest) -> Self {
        if request.include_thumbnail {
            Self::Enhanced
        } else {
            Self::Legacy
        }
    }
}

/// Enhanced per-image record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub original_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_uri: Option<String>,
}

impl From<ImageArtifact> for ArtifactRecord {
    fn from(artifact: ImageArtifact) -> Self {
        let file_name = artifact
            .file_name
            .or_else(|| artifact.source.last_segment().map(str::to_string))
            .unwrap_or_default();
        let (thumbnail, thumbnail_width, thumbnail_height) = match artifact.thumbnail {
            Some(t) => (
                Some(t.payload.as_wire().to_string()),
                Some(t.width),
                Some(t.height),
            ),
            None => (None, None, None),
        };

        Self {
            original_path: artifact.image.payload.as_wire().to_string(),
            file_name,
            file_size: artifact.image.byte_len,
            mime_type: ARTIFACT_MIME_TYPE.to_string(),
            width: artifact.image.width,
            height: artifact.image.height,
            thumbnail,
            thumbnail_width,
            thumbnail_height,
            content_uri: Some(artifact.source.as_str().to_string()),
        }
    }
}

/// What a successful pick returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PickResponse {
    Legacy(Vec<String>),
    Enhanced(Vec<ArtifactRecord>),
}

impl PickResponse {
    pub fn len(&self) -> usize {
        match self {
            PickResponse::Legacy(items) => items.len(),
            PickResponse::Enhanced(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every artifact string (primary payloads, then nothing else), in order.
    pub fn payloads(&self) -> Vec<&str> {
        match self {
            PickResponse::Legacy(items) => items.iter().map(String::as_str).collect(),
            PickResponse::Enhanced(items) => {
                items.iter().map(|r| r.original_path.as_str()).collect()
            }
        }
    }
}
