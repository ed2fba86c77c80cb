//! Media references and how to read them.
//!
//! A [`MediaReference`] is the opaque handle a selection source hands back
//! for each chosen image (a `content://` URI from the system picker, a
//! `file://` URI from the legacy picker). This crate never owns the
//! underlying media: the platform can revoke access at any time after the
//! picker closes, so the transform engine reads each reference exactly once
//! into memory and works from that copy.
//!
//! [`MediaResolver`] is the seam to the platform's content layer.
//! [`FsResolver`] is the filesystem implementation used by the CLI and tests.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error reading {reference}: {source}")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported reference scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Reference no longer accessible: {0}")]
    Revoked(String),
    #[error("Not a local file URI: {0}")]
    InvalidUri(String),
}

/// Opaque, platform-assigned handle to a selected image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaReference(String);

impl MediaReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// `file://` reference for a local path.
    pub fn from_path(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        match Url::from_file_path(&absolute) {
            Ok(url) => Self(url.into()),
            Err(()) => Self(format!("file://{}", absolute.display())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI scheme (`file`, `content`, ...), or `None` for a bare path.
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Last path segment, used as the display name when the platform has
    /// nothing better.
    pub fn last_segment(&self) -> Option<&str> {
        let path = self.0.split_once("://").map_or(self.0.as_str(), |(_, rest)| rest);
        let path = path.split(['?', '#']).next().unwrap_or(path);
        path.rsplit('/').find(|s| !s.is_empty())
    }
}

impl std::fmt::Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads media references on behalf of the transform engine.
pub trait MediaResolver: Send + Sync {
    /// Read the full content behind a reference.
    fn read(&self, reference: &MediaReference) -> Result<Vec<u8>, MediaError>;

    /// Human-facing file name for the reference.
    fn display_name(&self, reference: &MediaReference) -> Option<String> {
        reference.last_segment().map(str::to_string)
    }
}

/// Resolves `file://` URIs and bare paths from the local filesystem.
///
/// An optional `content_root` maps `content://authority/path` onto
/// `content_root/authority/path`, which is how the CLI stands in for a
/// platform content provider.
#[derive(Debug, Clone, Default)]
pub struct FsResolver {
    content_root: Option<PathBuf>,
}

impl FsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_root(root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: Some(root.into()),
        }
    }

    fn local_path(&self, reference: &MediaReference) -> Result<PathBuf, MediaError> {
        let uri = reference.as_str();
        match reference.scheme() {
            None => Ok(PathBuf::from(uri)),
            Some("file") => Url::parse(uri)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| MediaError::InvalidUri(uri.to_string())),
            Some("content") => match &self.content_root {
                Some(root) => Ok(root.join(&uri["content://".len()..])),
                None => Err(MediaError::UnsupportedScheme("content".to_string())),
            },
            Some(other) => Err(MediaError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl MediaResolver for FsResolver {
    /// Local files are named by their decoded file name, not the
    /// percent-encoded URI segment.
    fn display_name(&self, reference: &MediaReference) -> Option<String> {
        match self.local_path(reference) {
            Ok(path) if reference.scheme() == Some("file") => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            _ => reference.last_segment().map(str::to_string),
        }
    }

    fn read(&self, reference: &MediaReference) -> Result<Vec<u8>, MediaError> {
        let path = self.local_path(reference)?;
        std::fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                MediaError::Revoked(reference.to_string())
            }
            _ => MediaError::Io {
                reference: reference.to_string(),
                source,
            },
        })
    }
}
