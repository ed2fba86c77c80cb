//! Private cache area for file-reference artifacts.
//!
//! Every `FileReference` artifact is a JPEG written under
//! `<cache_root>/<dir_name>/` with a generated name
//! (`<prefix><uuid-v4>.jpg`). Names are collision-resistant, and files are
//! opened with `create_new`, so concurrent transforms within one call never
//! overwrite each other and no locking is needed: the directory is
//! append-only while a pick is being processed.
//!
//! Files outlive the call. Callers own cleanup; [`ArtifactCache::clear`] is
//! provided for that and is what the CLI's `clean-cache` command runs.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;
use uuid::Uuid;
use walkdir::WalkDir;

/// Default sub-directory of the cache root.
pub const DEFAULT_DIR_NAME: &str = "photo_picker_images";

/// Default artifact filename prefix.
pub const DEFAULT_FILE_PREFIX: &str = "image_";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error in {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} cannot be expressed as a file URI")]
    Uri { path: PathBuf },
}

/// Writer for the private artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
    prefix: String,
}

impl ArtifactCache {
    /// A relative `cache_root` is resolved against the current directory
    /// here, so every artifact path (and URI) is absolute.
    pub fn new(cache_root: &Path, dir_name: &str, prefix: &str) -> Self {
        let dir = cache_root.join(dir_name);
        Self {
            dir: std::path::absolute(&dir).unwrap_or(dir),
            prefix: prefix.to_string(),
        }
    }

    /// Cache under `cache_root` with the default directory name and prefix.
    pub fn with_defaults(cache_root: &Path) -> Self {
        Self::new(cache_root, DEFAULT_DIR_NAME, DEFAULT_FILE_PREFIX)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh artifact path. Not created yet.
    pub fn next_path(&self) -> PathBuf {
        self.dir.join(format!("{}{}.jpg", self.prefix, Uuid::new_v4()))
    }

    /// Persist encoded bytes under a new unique name and return the path.
    ///
    /// The file is flushed before returning, so the artifact is fully
    /// materialized when the caller sees it.
    pub fn write(&self, bytes: &[u8]) -> Result<PathBuf, CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.next_path();
        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        Ok(path)
    }

    /// Whether `path` is an artifact inside this cache.
    pub fn contains(&self, path: &Path) -> bool {
        path.parent() == Some(self.dir.as_path())
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&self.prefix))
    }

    /// Delete every artifact this cache generated. Returns how many were removed.
    ///
    /// Only files matching the prefix directly inside the cache directory are
    /// touched. A missing directory counts as already clean.
    pub fn clear(&self) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.dir.clone(),
                source: e.into(),
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && self.contains(path) {
                std::fs::remove_file(path).map_err(|source| CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                removed += 1;
            }
        }

        log::info!("cleared {} cached artifacts from {}", removed, self.dir.display());
        Ok(removed)
    }
}

/// Percent-encoded `file://` URI for an absolute artifact path.
pub fn file_uri(path: &Path) -> Result<String, CacheError> {
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| CacheError::Uri {
            path: path.to_path_buf(),
        })
}
