//! In-process host standing in for the platform pickers.
//!
//! Used by the CLI, where the files on the command line play the part of
//! the user's selection, and by tests. It answers the capability probe and
//! registration with scripted results and records every launch, so the
//! caller can deliver a [`SelectionResult`](super::SelectionResult) for the
//! token that was actually launched.

use super::legacy::LegacyPicker;
use super::modern::{ProbeError, RegistrationError, SystemPicker};
use super::{SelectionPlan, SourceKind};
use crate::request::PickRequest;
use crate::state::CorrelationToken;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A recorded launch from either source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub source: SourceKind,
    pub token: CorrelationToken,
    pub limit: u32,
}

pub struct ScriptedHost {
    probe: Result<bool, ProbeError>,
    registration: Result<(), RegistrationError>,
    launch_error: Option<String>,
    system_launch_error: Option<String>,
    probe_calls: AtomicUsize,
    register_calls: AtomicUsize,
    launches: Mutex<Vec<Launch>>,
    modern_plans: Mutex<Vec<(CorrelationToken, SelectionPlan)>>,
}

impl Default for ScriptedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHost {
    /// Supported, registrable, launches succeed.
    pub fn new() -> Self {
        Self {
            probe: Ok(true),
            registration: Ok(()),
            launch_error: None,
            system_launch_error: None,
            probe_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            launches: Mutex::new(Vec::new()),
            modern_plans: Mutex::new(Vec::new()),
        }
    }

    pub fn with_probe(mut self, probe: Result<bool, ProbeError>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_registration(mut self, registration: Result<(), RegistrationError>) -> Self {
        self.registration = registration;
        self
    }

    /// Both pickers fail to launch.
    pub fn with_launch_error(mut self, message: &str) -> Self {
        self.launch_error = Some(message.to_string());
        self
    }

    /// Only the system picker fails to launch.
    pub fn with_system_launch_error(mut self, message: &str) -> Self {
        self.system_launch_error = Some(message.to_string());
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    /// System picker launches with their plans.
    pub fn launches(&self) -> Vec<(CorrelationToken, SelectionPlan)> {
        self.modern_plans
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    /// Legacy picker launches with their limits.
    pub fn legacy_launches(&self) -> Vec<(CorrelationToken, u32)> {
        self.all_launches()
            .into_iter()
            .filter(|l| l.source == SourceKind::Legacy)
            .map(|l| (l.token, l.limit))
            .collect()
    }

    pub fn all_launches(&self) -> Vec<Launch> {
        self.launches.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Most recent launch from either source.
    pub fn last_launch(&self) -> Option<Launch> {
        self.launches.lock().ok().and_then(|l| l.last().cloned())
    }

    fn record(&self, launch: Launch) -> Result<(), String> {
        if let Some(message) = &self.launch_error {
            return Err(message.clone());
        }
        self.launches
            .lock()
            .map_err(|e| format!("launch log poisoned: {}", e))?
            .push(launch);
        Ok(())
    }
}

impl SystemPicker for ScriptedHost {
    fn probe(&self) -> Result<bool, ProbeError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.clone()
    }

    fn register(&self) -> Result<(), RegistrationError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.registration.clone()
    }

    fn launch(&self, token: &CorrelationToken, plan: SelectionPlan) -> Result<(), String> {
        if let Some(message) = &self.system_launch_error {
            return Err(message.clone());
        }
        self.record(Launch {
            source: SourceKind::Modern,
            token: token.clone(),
            limit: plan.limit(),
        })?;
        self.modern_plans
            .lock()
            .map_err(|e| format!("launch log poisoned: {}", e))?
            .push((token.clone(), plan));
        Ok(())
    }
}

impl LegacyPicker for ScriptedHost {
    fn launch(
        &self,
        token: &CorrelationToken,
        _request: &PickRequest,
        limit: u32,
    ) -> Result<(), String> {
        self.record(Launch {
            source: SourceKind::Legacy,
            token: token.clone(),
            limit,
        })
    }
}
