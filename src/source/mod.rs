//! Selection Source Abstraction.
//!
//! Two ways to let the user choose images sit behind [`SelectionSource`]:
//!
//! - [`ModernSource`]: the platform's system photo picker. Usable only when
//!   a capability probe says so *and* its result callback could be
//!   registered before the host surface was first shown. Both checks run at
//!   most once per process and are cached.
//! - [`LegacySource`]: the plugin's own multi-select screen. Always
//!   available, gated on storage-read permission.
//!
//! A source only *launches* the UI. The user's answer arrives later, tagged
//! with the [`CorrelationToken`] it was launched with, as a
//! [`SelectionResult`] handed to the orchestrator.

pub mod legacy;
pub mod modern;
pub mod scripted;

pub use legacy::{LegacyPicker, LegacySource};
pub use modern::{ModernSource, ProbeError, RegistrationError, SystemPicker};
pub use scripted::ScriptedHost;

use crate::media::MediaReference;
use crate::request::PickRequest;
use crate::state::CorrelationToken;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when the system picker cannot be used.
pub const MODERN_UNAVAILABLE: &str = "Photo Picker not available. Please use the legacy picker.";

/// Message used when storage-read permission is refused.
pub const PERMISSION_DENIED: &str = "Permission denied";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source cannot be used for this request; another may be tried.
    #[error("{0}")]
    Unavailable(String),
    /// The UI could not be shown.
    #[error("Failed to launch picker: {0}")]
    Launch(String),
    #[error("Capability probe failed: {0}")]
    ProbeFailed(String),
    #[error("Permission denied")]
    PermissionDenied,
}

impl SourceError {
    /// Whether the next source in preference order should be tried after
    /// `from` failed with this error.
    ///
    /// A system picker that cannot be launched falls back to legacy; a
    /// legacy launch failure is final.
    pub fn allows_fallback(&self, from: SourceKind) -> bool {
        match self {
            SourceError::Unavailable(_) | SourceError::ProbeFailed(_) => true,
            SourceError::Launch(_) => from == SourceKind::Modern,
            SourceError::PermissionDenied => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Modern,
    Legacy,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Modern => f.write_str("modern"),
            SourceKind::Legacy => f.write_str("legacy"),
        }
    }
}

/// Which selection flow to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPlan {
    Single,
    Multiple { limit: u32 },
}

impl SelectionPlan {
    /// `1` gives the single-choice flow; anything else a multi-choice flow
    /// offering `min(requested, ceiling)`.
    pub fn for_count(requested: u32, ceiling: u32) -> Self {
        if requested <= 1 {
            SelectionPlan::Single
        } else {
            SelectionPlan::Multiple {
                limit: requested.min(ceiling).max(1),
            }
        }
    }

    pub fn limit(self) -> u32 {
        match self {
            SelectionPlan::Single => 1,
            SelectionPlan::Multiple { limit } => limit,
        }
    }
}

/// What `try_select` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The selection UI is showing.
    Launched(SelectionPlan),
    /// The permission prompt is showing; the UI follows a grant.
    AwaitingPermission,
}

/// The user's answer, as reported by a selection source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    /// References in selection order. May be empty.
    Selected(Vec<MediaReference>),
    Cancelled,
    /// Cancelled with an explicit error from the picker.
    CancelledWithError(String),
    /// A result code the picker protocol does not define.
    Unrecognized,
}

/// Result codes of the legacy picker's activity protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    Canceled,
    Other(i32),
}

/// Extras attached to a legacy picker result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultData {
    pub references: Vec<MediaReference>,
    pub error_message: Option<String>,
}

impl SelectionResult {
    /// Map the legacy picker's `(code, data)` pair.
    ///
    /// | code | data | result |
    /// |---|---|---|
    /// | OK | present | `Selected` |
    /// | CANCELED | present, with message | `CancelledWithError` |
    /// | CANCELED | absent, or no message | `Cancelled` |
    /// | anything else | - | `Unrecognized` |
    pub fn from_activity_result(code: ResultCode, data: Option<ResultData>) -> Self {
        match (code, data) {
            (ResultCode::Ok, Some(data)) => SelectionResult::Selected(data.references),
            (
                ResultCode::Canceled,
                Some(ResultData {
                    error_message: Some(message),
                    ..
                }),
            ) => SelectionResult::CancelledWithError(message),
            (ResultCode::Canceled, _) => SelectionResult::Cancelled,
            _ => SelectionResult::Unrecognized,
        }
    }
}

/// One way of letting the user pick images.
pub trait SelectionSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Cheap, cached availability check.
    fn is_available(&self) -> bool;

    /// `maximumImagesCount` when the request omits it.
    fn default_max(&self) -> u32;

    /// Show the selection UI for `request`. The result is delivered later
    /// under `token`.
    fn try_select(
        &self,
        token: &CorrelationToken,
        request: &PickRequest,
    ) -> Result<LaunchOutcome, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_single_for_one() {
        assert_eq!(SelectionPlan::for_count(1, 100), SelectionPlan::Single);
    }

    #[test]
    fn plan_caps_at_ceiling() {
        assert_eq!(
            SelectionPlan::for_count(250, 100),
            SelectionPlan::Multiple { limit: 100 }
        );
        assert_eq!(
            SelectionPlan::for_count(15, 100),
            SelectionPlan::Multiple { limit: 15 }
        );
        assert_eq!(SelectionPlan::for_count(15, 100).limit(), 15);
    }

    #[test]
    fn activity_ok_with_data_is_selected() {
        let refs = vec![MediaReference::new("file:///a.jpg")];
        let result = SelectionResult::from_activity_result(
            ResultCode::Ok,
            Some(ResultData {
                references: refs.clone(),
                error_message: None,
            }),
        );
        assert_eq!(result, SelectionResult::Selected(refs));
    }

    #[test]
    fn activity_ok_without_data_is_unrecognized() {
        assert_eq!(
            SelectionResult::from_activity_result(ResultCode::Ok, None),
            SelectionResult::Unrecognized
        );
    }

    #[test]
    fn activity_cancel_variants() {
        assert_eq!(
            SelectionResult::from_activity_result(ResultCode::Canceled, None),
            SelectionResult::Cancelled
        );
        assert_eq!(
            SelectionResult::from_activity_result(
                ResultCode::Canceled,
                Some(ResultData {
                    references: vec![],
                    error_message: Some("Storage unavailable".into()),
                })
            ),
            SelectionResult::CancelledWithError("Storage unavailable".into())
        );
        assert_eq!(
            SelectionResult::from_activity_result(ResultCode::Canceled, Some(ResultData::default())),
            SelectionResult::Cancelled
        );
    }

    #[test]
    fn activity_other_code_is_unrecognized() {
        assert_eq!(
            SelectionResult::from_activity_result(ResultCode::Other(7), Some(ResultData::default())),
            SelectionResult::Unrecognized
        );
    }

    #[test]
    fn fallback_rules() {
        use SourceKind::{Legacy, Modern};
        assert!(SourceError::Unavailable(MODERN_UNAVAILABLE.into()).allows_fallback(Modern));
        assert!(SourceError::ProbeFailed("x".into()).allows_fallback(Modern));
        assert!(SourceError::Launch("x".into()).allows_fallback(Modern));
        assert!(!SourceError::Launch("x".into()).allows_fallback(Legacy));
        assert!(!SourceError::PermissionDenied.allows_fallback(Legacy));
    }

    #[test]
    fn launch_error_message() {
        assert_eq!(
            SourceError::Launch("no activity".into()).to_string(),
            "Failed to launch picker: no activity"
        );
    }
}
