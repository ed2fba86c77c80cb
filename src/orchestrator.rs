//! Picker Orchestrator.
//!
//! Drives one pick from raw options to a single terminal signal:
//!
//! ```text
//! Idle ──pick──▶ AwaitingSelection ──deliver_selection──▶ Processing ──▶ Idle
//!                  │    ▲                                        (rayon)
//!                  │    └── on_permission_result (legacy only)
//!                  └── cancel / failure ──▶ Idle
//! ```
//!
//! - A new `pick` while one is pending replaces the pending completion; the
//!   old one is dropped without being called.
//! - The source is chosen per request: the system picker when it is
//!   available and initializable, otherwise the legacy picker. A system
//!   picker that turns out unusable at launch falls back to legacy for the
//!   same request.
//! - While `AwaitingSelection`, the token and request are persisted by
//!   [`PendingStore`], so [`Picker::restore`] can reattach a completion after
//!   process death.
//! - The transform pass runs on the rayon pool; the completion is invoked
//!   from the worker thread.

use crate::artifact::{PickResponse, ResultSet};
use crate::cache::ArtifactCache;
use crate::config::{FailurePolicy, PickerConfig};
use crate::imaging::{ImageBackend, TransformContext, transform_all};
use crate::media::{FsResolver, MediaReference, MediaResolver};
use crate::permission::PermissionGate;
use crate::request::{PickRequest, RequestError};
use crate::source::{
    LaunchOutcome, LegacyPicker, LegacySource, MODERN_UNAVAILABLE, ModernSource, SelectionResult,
    SelectionSource, SourceError, SourceKind, SystemPicker,
};
use crate::state::{CorrelationToken, PendingSelection, PendingStore, StateError};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Reason reported for a result code the picker protocol does not define.
pub const NO_IMAGES_SELECTED: &str = "No images selected";

/// Caller-facing failure: one human-readable reason.
///
/// Serializes as the bare reason string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct PickFailure {
    reason: String,
}

impl PickFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Serialize for PickFailure {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.reason)
    }
}

impl From<SourceError> for PickFailure {
    fn from(e: SourceError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<RequestError> for PickFailure {
    fn from(e: RequestError) -> Self {
        Self::new(e.to_string())
    }
}

/// Receives the single terminal signal of a pick.
pub type Completion = Box<dyn FnOnce(Result<PickResponse, PickFailure>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingSelection,
    Processing,
}

struct Pending {
    selection: PendingSelection,
    completion: Completion,
    awaiting_permission: bool,
}

#[derive(Default)]
struct Inner {
    pending: Option<Pending>,
    processing: Option<CorrelationToken>,
}

struct Engine {
    backend: Arc<dyn ImageBackend>,
    resolver: Arc<dyn MediaResolver>,
    cache: ArtifactCache,
    policy: FailurePolicy,
}

impl Engine {
    fn run(&self, references: &[MediaReference], request: &PickRequest) -> ResultSet {
        let ctx = TransformContext {
            backend: self.backend.as_ref(),
            resolver: self.resolver.as_ref(),
            cache: &self.cache,
        };
        transform_all(&ctx, references, request, self.policy)
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The picker plugin: one instance per host process.
pub struct Picker {
    modern: Option<ModernSource>,
    legacy: LegacySource,
    engine: Arc<Engine>,
    store: PendingStore,
    inner: Arc<Mutex<Inner>>,
}

impl Picker {
    pub fn builder(
        config: PickerConfig,
        legacy: Arc<dyn LegacyPicker>,
        permission: Arc<dyn PermissionGate>,
    ) -> PickerBuilder {
        PickerBuilder {
            config,
            legacy,
            permission,
            system_picker: None,
            backend: None,
            resolver: None,
            cache_root: None,
            state_dir: None,
        }
    }

    /// Register the system picker's result callback.
    ///
    /// Call while the host surface is being set up; registration after the
    /// surface is shown fails and the system picker stays unused.
    pub fn initialize(&self) {
        if let Some(modern) = &self.modern {
            if modern.is_available() && modern.initialize().is_ok() {
                log::debug!("system picker ready");
            }
        }
    }

    pub fn phase(&self) -> Phase {
        let inner = lock(&self.inner);
        if inner.pending.is_some() {
            Phase::AwaitingSelection
        } else if inner.processing.is_some() {
            Phase::Processing
        } else {
            Phase::Idle
        }
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.engine.cache
    }

    pub fn permission(&self) -> &Arc<dyn PermissionGate> {
        self.legacy.permission()
    }

    /// Start a pick from a raw options object.
    ///
    /// Malformed options complete immediately with a failure and no UI is
    /// shown; `None` is returned in that case.
    pub fn pick(&self, options: &Value, completion: Completion) -> Option<CorrelationToken> {
        match PickRequest::from_options(options) {
            Ok(request) => Some(self.pick_request(request, completion)),
            Err(e) => {
                log::warn!("rejecting pick: {}", e);
                completion(Err(e.into()));
                None
            }
        }
    }

    /// Start a pick from an already normalized request.
    pub fn pick_request(&self, request: PickRequest, completion: Completion) -> CorrelationToken {
        let token = CorrelationToken::generate();
        {
            let mut inner = lock(&self.inner);
            if let Some(previous) = inner.pending.take() {
                log::info!(
                    "pick {} replaces pending pick {}",
                    token,
                    previous.selection.token
                );
            }
            inner.pending = Some(Pending {
                selection: PendingSelection {
                    token: token.clone(),
                    source: SourceKind::Legacy,
                    request: request.clone(),
                },
                completion,
                awaiting_permission: false,
            });
        }

        match self.launch(&token, &request) {
            Ok(LaunchOutcome::AwaitingPermission) => {
                if let Some(p) = lock(&self.inner).pending.as_mut() {
                    if p.selection.token == token {
                        p.awaiting_permission = true;
                    }
                }
            }
            Ok(LaunchOutcome::Launched(plan)) => {
                log::debug!("pick {} awaiting selection ({:?})", token, plan);
            }
            Err(e) => self.fail(&token, e.into()),
        }
        token
    }

    fn candidates(&self) -> impl Iterator<Item = &dyn SelectionSource> {
        self.modern
            .iter()
            .map(|m| m as &dyn SelectionSource)
            .chain(std::iter::once(&self.legacy as &dyn SelectionSource))
    }

    fn launch(
        &self,
        token: &CorrelationToken,
        request: &PickRequest,
    ) -> Result<LaunchOutcome, SourceError> {
        let mut last_error = None;
        for source in self.candidates() {
            if !source.is_available() {
                log::debug!("{} source unavailable, skipping", source.kind());
                continue;
            }
            self.record_source(token, source.kind());
            match source.try_select(token, request) {
                Ok(outcome) => {
                    log::info!("pick {} using {} source", token, source.kind());
                    return Ok(outcome);
                }
                Err(e) if e.allows_fallback(source.kind()) => {
                    log::info!("{} source unusable ({}), falling back", source.kind(), e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| SourceError::Unavailable(MODERN_UNAVAILABLE.to_string())))
    }

    /// Note which source owns the pending pick and persist it.
    fn record_source(&self, token: &CorrelationToken, kind: SourceKind) {
        let snapshot = {
            let mut inner = lock(&self.inner);
            match inner.pending.as_mut() {
                Some(p) if p.selection.token == *token => {
                    p.selection.source = kind;
                    p.selection.clone()
                }
                _ => return,
            }
        };
        if let Err(e) = self.store.save(&snapshot) {
            log::error!("could not persist pending pick {}: {}", token, e);
        }
    }

    /// The user answered the storage permission prompt.
    pub fn on_permission_result(&self, granted: bool) {
        let (token, request) = {
            let mut inner = lock(&self.inner);
            match inner.pending.as_mut() {
                Some(p) if p.awaiting_permission => {
                    p.awaiting_permission = false;
                    (p.selection.token.clone(), p.selection.request.clone())
                }
                _ => {
                    log::warn!("permission result with no pick waiting for it");
                    return;
                }
            }
        };

        if let Err(e) = self.legacy.resume(granted, &token, &request) {
            self.fail(&token, e.into());
        }
    }

    /// A source reports the user's answer for `token`.
    ///
    /// Returns `false` (and does nothing) when `token` is not the pending pick,
    /// e.g. a result for a pick that was since replaced.
    pub fn deliver_selection(&self, token: &CorrelationToken, result: SelectionResult) -> bool {
        let pending = {
            let mut inner = lock(&self.inner);
            let pending = inner.pending.take_if(|p| p.selection.token == *token);
            if pending.is_some() && matches!(result, SelectionResult::Selected(ref refs) if !refs.is_empty()) {
                inner.processing = Some(token.clone());
            }
            pending
        };
        let Some(pending) = pending else {
            log::warn!("ignoring selection for unknown pick {}", token);
            return false;
        };
        self.clear_store();

        let Pending {
            selection,
            completion,
            ..
        } = pending;
        let request = selection.request;

        match result {
            SelectionResult::Selected(references) if !references.is_empty() => {
                log::debug!("pick {}: processing {} references", token, references.len());
                self.spawn_transform(token.clone(), references, request, completion);
            }
            SelectionResult::Selected(_) | SelectionResult::Cancelled => {
                log::debug!("pick {} cancelled", token);
                completion(Ok(ResultSet::empty().into_response(&request)));
            }
            SelectionResult::CancelledWithError(message) => {
                completion(Err(PickFailure::new(message)));
            }
            SelectionResult::Unrecognized => {
                completion(Err(PickFailure::new(NO_IMAGES_SELECTED)));
            }
        }
        true
    }

    fn spawn_transform(
        &self,
        token: CorrelationToken,
        references: Vec<MediaReference>,
        request: PickRequest,
        completion: Completion,
    ) {
        let engine = Arc::clone(&self.engine);
        let inner = Arc::clone(&self.inner);
        rayon::spawn(move || {
            let set = engine.run(&references, &request);
            log::info!(
                "pick {} produced {} of {} images",
                token,
                set.len(),
                references.len()
            );
            let response = set.into_response(&request);
            {
                let mut guard = lock(&inner);
                if guard.processing.as_ref() == Some(&token) {
                    guard.processing = None;
                }
            }
            completion(Ok(response));
        });
    }

    /// Reattach a completion to a pick persisted before process death.
    ///
    /// Returns the restored token, or `None` when nothing was pending.
    pub fn restore(&self, completion: Completion) -> Result<Option<CorrelationToken>, StateError> {
        let Some(selection) = self.store.load()? else {
            return Ok(None);
        };
        let token = selection.token.clone();
        log::info!("restored pending pick {} ({} source)", token, selection.source);
        lock(&self.inner).pending = Some(Pending {
            selection,
            completion,
            awaiting_permission: false,
        });
        Ok(Some(token))
    }

    fn fail(&self, token: &CorrelationToken, failure: PickFailure) {
        let pending = lock(&self.inner)
            .pending
            .take_if(|p| p.selection.token == *token);
        match pending {
            Some(p) => {
                self.clear_store();
                log::warn!("pick {} failed: {}", token, failure);
                (p.completion)(Err(failure));
            }
            None => log::debug!("failure for replaced pick {}: {}", token, failure),
        }
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            log::error!("could not clear pending pick state: {}", e);
        }
    }
}

/// Assembles a [`Picker`] from config and host collaborators.
pub struct PickerBuilder {
    config: PickerConfig,
    legacy: Arc<dyn LegacyPicker>,
    permission: Arc<dyn PermissionGate>,
    system_picker: Option<Arc<dyn SystemPicker>>,
    backend: Option<Arc<dyn ImageBackend>>,
    resolver: Option<Arc<dyn MediaResolver>>,
    cache_root: Option<PathBuf>,
    state_dir: Option<PathBuf>,
}

impl PickerBuilder {
    /// Enable the system picker.
    pub fn system_picker(mut self, host: Arc<dyn SystemPicker>) -> Self {
        self.system_picker = Some(host);
        self
    }

    /// Defaults to the `image`-crate backend configured from `[decode]`.
    pub fn backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Defaults to [`FsResolver`].
    pub fn resolver(mut self, resolver: Arc<dyn MediaResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Defaults to the system temp directory.
    pub fn cache_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(dir.into());
        self
    }

    /// Defaults to the cache root.
    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Picker {
        let config = self.config;
        let cache_root = self.cache_root.unwrap_or_else(std::env::temp_dir);
        let state_dir = self.state_dir.unwrap_or_else(|| cache_root.clone());
        let cache = ArtifactCache::new(&cache_root, &config.cache.dir_name, &config.cache.file_prefix);
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(config.backend()) as Arc<dyn ImageBackend>);
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(FsResolver::new()) as Arc<dyn MediaResolver>);

        Picker {
            modern: self
                .system_picker
                .map(|host| ModernSource::new(host, config.selection.clone())),
            legacy: LegacySource::new(
                self.legacy,
                self.permission,
                config.selection.legacy_default_max,
            ),
            engine: Arc::new(Engine {
                backend,
                resolver,
                cache,
                policy: config.failures.policy,
            }),
            store: PendingStore::new(&state_dir),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }
}
