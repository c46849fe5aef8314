//! Printer session state
//!
//! One [`PrinterSession`] exists per process. It owns the single cached
//! device handle and the two flags the monitor and executor coordinate
//! through: `busy` and `last_known_available`.

use crate::device::Device;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// The cached device handle and its validity flag
///
/// Guarded by the session mutex; holding the guard for the duration of a
/// job is what serializes device access.
pub(crate) struct SessionInner {
    pub(crate) device: Option<Box<dyn Device>>,
    pub(crate) initialized: bool,
}

impl SessionInner {
    /// Drop the cached handle so the next attempt starts clean
    pub(crate) async fn reset(&mut self) {
        if let Some(mut device) = self.device.take() {
            let _ = device.close().await;
        }
        self.initialized = false;
    }
}

/// Process-wide relationship to one physical printer
///
/// Invariant: at most one non-null device handle exists at a time, and
/// `busy == true` for exactly the duration of a job attempt.
pub struct PrinterSession {
    inner: Mutex<SessionInner>,
    busy: AtomicBool,
    last_known_available: AtomicBool,
}

impl PrinterSession {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                device: None,
                initialized: false,
            }),
            busy: AtomicBool::new(false),
            last_known_available: AtomicBool::new(false),
        }
    }

    /// True while a job attempt is executing
    ///
    /// The monitor checks this before probing and skips the cycle when
    /// set, so a probe never competes with an active job for the device.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Mark the session busy for the lifetime of the returned guard
    ///
    /// The guard clears the flag on drop, which covers every exit path
    /// of the executor including panics.
    pub(crate) fn begin_job(&self) -> BusyGuard<'_> {
        self.busy.store(true, Ordering::SeqCst);
        BusyGuard { session: self }
    }

    /// Last availability the monitor observed
    pub fn last_known_available(&self) -> bool {
        self.last_known_available.load(Ordering::SeqCst)
    }

    pub fn set_last_known_available(&self, available: bool) {
        self.last_known_available.store(available, Ordering::SeqCst);
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().await
    }

    /// Discard the cached device handle
    ///
    /// Called on monitor-detected transitions, after failed attempts and
    /// between retries; the next job constructs a fresh handle.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        if inner.device.is_some() || inner.initialized {
            debug!("Invalidating cached printer handle");
        }
        inner.reset().await;
    }

    /// Tear down the session, closing any cached handle
    pub async fn shutdown(&self) {
        self.invalidate().await;
    }
}

impl Default for PrinterSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the session's busy flag on drop
pub(crate) struct BusyGuard<'a> {
    session: &'a PrinterSession,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.busy.store(false, Ordering::SeqCst);
    }
}
