//! The plugin's own multi-select screen.
//!
//! Always available, but it reads the media store directly and so needs
//! storage-read permission. Without it, `try_select` fires the OS prompt and
//! reports [`LaunchOutcome::AwaitingPermission`]; the orchestrator calls
//! [`LegacySource::resume`] once the user answers.

use super::{LaunchOutcome, SelectionPlan, SelectionSource, SourceError, SourceKind};
use crate::permission::PermissionGate;
use crate::request::PickRequest;
use crate::state::CorrelationToken;
use std::sync::Arc;

/// Host-side hook that shows the legacy picker.
pub trait LegacyPicker: Send + Sync {
    /// Show the picker. The request is passed through whole because the
    /// legacy screen receives every option. Results come back under `token`.
    fn launch(
        &self,
        token: &CorrelationToken,
        request: &PickRequest,
        limit: u32,
    ) -> Result<(), String>;
}

pub struct LegacySource {
    host: Arc<dyn LegacyPicker>,
    permission: Arc<dyn PermissionGate>,
    default_max: u32,
}

impl LegacySource {
    pub fn new(
        host: Arc<dyn LegacyPicker>,
        permission: Arc<dyn PermissionGate>,
        default_max: u32,
    ) -> Self {
        Self {
            host,
            permission,
            default_max,
        }
    }

    pub fn permission(&self) -> &Arc<dyn PermissionGate> {
        &self.permission
    }

    fn launch(
        &self,
        token: &CorrelationToken,
        request: &PickRequest,
    ) -> Result<LaunchOutcome, SourceError> {
        let limit = request.max_count_or(self.default_max);
        log::debug!("launching legacy picker (limit {}) for {}", limit, token);
        self.host
            .launch(token, request, limit)
            .map_err(SourceError::Launch)?;
        Ok(LaunchOutcome::Launched(SelectionPlan::Multiple { limit }))
    }

    /// Continue after the permission prompt.
    pub fn resume(
        &self,
        granted: bool,
        token: &CorrelationToken,
        request: &PickRequest,
    ) -> Result<LaunchOutcome, SourceError> {
        if !granted {
            return Err(SourceError::PermissionDenied);
        }
        self.launch(token, request)
    }
}

impl SelectionSource for LegacySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Legacy
    }

    fn is_available(&self) -> bool {
        true
    }

    fn default_max(&self) -> u32 {
        self.default_max
    }

    fn try_select(
        &self,
        token: &CorrelationToken,
        request: &PickRequest,
    ) -> Result<LaunchOutcome, SourceError> {
        if self.permission.has_read_permission() {
            self.launch(token, request)
        } else {
            log::info!("storage read permission missing, prompting");
            self.permission.request_read_permission();
            Ok(LaunchOutcome::AwaitingPermission)
        }
    }
}
