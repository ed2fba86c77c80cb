//! Storage-read permission, as seen from the picker.
//!
//! The OS dialog itself lives outside this crate. [`PermissionGate`] is the
//! seam: it answers "is read access granted right now?" and fires the
//! prompt. The user's answer comes back later through
//! [`Picker::on_permission_result`](crate::orchestrator::Picker::on_permission_result).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Platform permission collaborator.
pub trait PermissionGate: Send + Sync {
    fn has_read_permission(&self) -> bool;

    /// Show the OS prompt. Returns immediately; the answer is asynchronous.
    fn request_read_permission(&self);
}

/// Fixed-answer gate for the CLI and tests.
///
/// Starts granted or denied and counts how often the prompt was requested.
#[derive(Debug, Default)]
pub struct StaticPermission {
    granted: AtomicBool,
    requests: AtomicUsize,
}

impl StaticPermission {
    pub fn granted() -> Self {
        Self {
            granted: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn denied() -> Self {
        Self::default()
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionGate for StaticPermission {
    fn has_read_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn request_read_permission(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        log::debug!("read permission requested");
    }
}
