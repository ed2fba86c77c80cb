//! The platform's system photo picker.
//!
//! Two things must hold before it is used:
//!
//! 1. **Capability**: [`SystemPicker::probe`] reports support (OS version
//!    gate, or a backported picker module being installed).
//! 2. **Registration**: the result callback was attached to the host
//!    surface before that surface was first shown. Hosts refuse late
//!    registration, so [`ModernSource::initialize`] should run while the
//!    plugin is being set up.
//!
//! Each check runs at most once per process; the outcome (success *or*
//! failure) is cached in a [`OnceLock`].

use super::{LaunchOutcome, MODERN_UNAVAILABLE, SelectionPlan, SelectionSource, SourceError, SourceKind};
use crate::config::SelectionConfig;
use crate::request::PickRequest;
use crate::state::CorrelationToken;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Capability probe failed: {0}")]
pub struct ProbeError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("host surface already shown; result callback can no longer be registered")]
    TooLate,
    #[error("registration failed: {0}")]
    Failed(String),
}

/// Host-side hooks for the system picker.
pub trait SystemPicker: Send + Sync {
    /// Whether the platform offers the system picker.
    fn probe(&self) -> Result<bool, ProbeError>;

    /// Attach the result callback to the host surface.
    fn register(&self) -> Result<(), RegistrationError>;

    /// Show the picker. Results come back under `token`.
    fn launch(&self, token: &CorrelationToken, plan: SelectionPlan) -> Result<(), String>;
}

pub struct ModernSource {
    host: Arc<dyn SystemPicker>,
    selection: SelectionConfig,
    probe: OnceLock<Result<bool, ProbeError>>,
    registration: OnceLock<Result<(), RegistrationError>>,
}

impl ModernSource {
    pub fn new(host: Arc<dyn SystemPicker>, selection: SelectionConfig) -> Self {
        Self {
            host,
            selection,
            probe: OnceLock::new(),
            registration: OnceLock::new(),
        }
    }

    /// Cached capability probe.
    pub fn probe(&self) -> &Result<bool, ProbeError> {
        self.probe.get_or_init(|| {
            let result = self.host.probe();
            match &result {
                Ok(supported) => log::debug!("system picker supported: {}", supported),
                Err(e) => log::error!("system picker probe failed: {}", e),
            }
            result
        })
    }

    /// Register the result callback, once. Later calls return the cached outcome.
    pub fn initialize(&self) -> Result<(), RegistrationError> {
        self.registration
            .get_or_init(|| {
                let result = self.host.register();
                if let Err(e) = &result {
                    log::error!("system picker registration failed: {}", e);
                }
                result
            })
            .clone()
    }

    pub fn plan_for(&self, request: &PickRequest) -> SelectionPlan {
        SelectionPlan::for_count(
            request.max_count_or(self.selection.modern_default_max),
            self.selection.modern_ceiling,
        )
    }
}

impl SelectionSource for ModernSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Modern
    }

    fn is_available(&self) -> bool {
        matches!(self.probe(), Ok(true))
    }

    fn default_max(&self) -> u32 {
        self.selection.modern_default_max
    }

    fn try_select(
        &self,
        token: &CorrelationToken,
        request: &PickRequest,
    ) -> Result<LaunchOutcome, SourceError> {
        match self.probe() {
            Ok(true) => {}
            Ok(false) => return Err(SourceError::Unavailable(MODERN_UNAVAILABLE.to_string())),
            Err(e) => return Err(SourceError::ProbeFailed(e.0.clone())),
        }
        self.initialize()
            .map_err(|_| SourceError::Unavailable(MODERN_UNAVAILABLE.to_string()))?;

        let plan = self.plan_for(request);
        log::debug!("launching system picker {:?} for {}", plan, token);
        self.host.launch(token, plan).map_err(SourceError::Launch)?;
        Ok(LaunchOutcome::Launched(plan))
    }
}
