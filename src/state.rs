//! Durable record of the pick that is waiting for the user.
//!
//! The host may kill the process while the selection UI is in front. What
//! must survive is the correlation token plus the request it belongs to, so
//! the result delivered after a restart can be matched and processed with
//! the right options. One JSON file holds it:
//!
//! ```json
//! {
//!   "token": "6f1c0b9e-...",
//!   "source": "Legacy",
//!   "request": { "max_count": null, "bounds": { "width": 100, "height": 100 }, ... }
//! }
//! ```
//!
//! The file exists only while a pick is `AwaitingSelection`.

use crate::request::PickRequest;
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Name of the pending-pick file inside the state directory.
pub const PENDING_FILENAME: &str = "pending-pick.json";

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identity of one pick, echoed back by the selection source with its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What is persisted while waiting for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub token: CorrelationToken,
    pub source: SourceKind,
    pub request: PickRequest,
}

/// JSON-file store for the single pending pick.
#[derive(Debug, Clone)]
pub struct PendingStore {
    path: PathBuf,
}

impl PendingStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(PENDING_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the pending pick. A missing file means nothing is pending.
    pub fn load(&self) -> Result<Option<PendingSelection>, StateError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Persist, replacing whatever was pending before.
    ///
    /// Written to a sibling temp file and renamed, so a crash mid-write
    /// never leaves a truncated record.
    pub fn save(&self, pending: &PendingSelection) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(pending)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StateError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
