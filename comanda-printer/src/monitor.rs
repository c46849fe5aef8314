//! Device availability monitor
//!
//! Answers "is the printer reachable right now" without disturbing an
//! in-progress job, and notifies subscribers only on change. Probes are
//! short-lived handles that are closed and discarded immediately; they
//! are never shared with the session's cached handle.

use crate::device::DeviceProvider;
use crate::session::PrinterSession;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle for removing a registered status callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type StatusCallback = Box<dyn Fn(bool) + Send + Sync>;

/// Availability monitor
///
/// Polls the device on a fixed interval, skipping cycles while a job is
/// executing, and reports availability transitions to subscribers.
pub struct AvailabilityMonitor {
    session: Arc<PrinterSession>,
    provider: Arc<dyn DeviceProvider>,
    callbacks: Mutex<HashMap<u64, StatusCallback>>,
    next_id: AtomicU64,
    poll_interval: Duration,
    probe_timeout: Duration,
    shutdown: CancellationToken,
}

impl AvailabilityMonitor {
    pub fn new(session: Arc<PrinterSession>, provider: Arc<dyn DeviceProvider>) -> Self {
        Self {
            session,
            provider,
            callbacks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Register a status callback; fires on every availability transition
    pub fn subscribe(&self, callback: impl Fn(bool) + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks
            .lock()
            .unwrap()
            .insert(id, Box::new(callback));
        SubscriptionId(id)
    }

    /// Remove a previously registered callback
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.callbacks.lock().unwrap().remove(&id.0);
    }

    /// Spawn the polling loop
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run().await })
    }

    async fn run(&self) {
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "Availability monitor started"
        );
        let mut ticker = interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }

        info!("Availability monitor stopped");
    }

    /// One poll cycle: probe unless a job holds the device
    pub(crate) async fn poll_once(&self) {
        if self.session.is_busy() {
            debug!("Job in progress, skipping availability check");
            return;
        }

        let available = self.check_availability().await;
        self.apply(available, false).await;
    }

    /// Probe the device once
    ///
    /// Opens a short-lived handle with a bounded timeout; any failure or
    /// timeout maps to `false`, never an error.
    pub async fn check_availability(&self) -> bool {
        let mut probe = self.provider.device();
        match tokio::time::timeout(self.probe_timeout, probe.open()).await {
            Ok(Ok(())) => {
                let _ = probe.close().await;
                true
            }
            Ok(Err(e)) => {
                debug!(error = %e, "Availability probe failed");
                false
            }
            Err(_) => {
                debug!("Availability probe timed out");
                false
            }
        }
    }

    /// Re-check availability and always notify subscribers, even
    /// without a transition
    ///
    /// Used for operator-triggered and post-reconnect re-validation.
    /// While a job holds the device the last known value is reported
    /// instead of probing; a probe must never compete with an active
    /// job for the device.
    pub async fn force_check(&self) -> bool {
        if self.session.is_busy() {
            let available = self.session.last_known_available();
            debug!(available, "Job in progress, reporting last known availability");
            self.notify(available);
            return available;
        }

        let available = self.check_availability().await;
        self.apply(available, true).await;
        available
    }

    async fn apply(&self, available: bool, always_notify: bool) {
        let changed = self.session.last_known_available() != available;

        if changed {
            info!(available, "Printer availability changed");
            self.session.set_last_known_available(available);
            // The backing device identity may have changed; the cached
            // handle is no longer trustworthy.
            self.session.invalidate().await;
        }

        if changed || always_notify {
            self.notify(available);
        }
    }

    fn notify(&self, available: bool) {
        let callbacks = self.callbacks.lock().unwrap();
        for (id, callback) in callbacks.iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(available))).is_err() {
                error!(subscription = *id, "Status callback panicked");
            }
        }
    }

    /// Stop the polling loop and drop all callbacks; idempotent
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.callbacks.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeProvider;

    fn monitor_with(provider: FakeProvider) -> (Arc<AvailabilityMonitor>, Arc<PrinterSession>) {
        let session = Arc::new(PrinterSession::new());
        let monitor = Arc::new(AvailabilityMonitor::new(
            session.clone(),
            Arc::new(provider),
        ));
        (monitor, session)
    }

    fn record_notifications(monitor: &AvailabilityMonitor) -> Arc<Mutex<Vec<bool>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        monitor.subscribe(move |available| sink.lock().unwrap().push(available));
        seen
    }

    #[tokio::test]
    async fn test_notifies_once_per_transition() {
        // Three consecutive successful probes: one callback, for the
        // initial false -> true transition only
        let (monitor, _session) = monitor_with(FakeProvider::always_ok());
        let seen = record_notifications(&monitor);

        for _ in 0..3 {
            monitor.poll_once().await;
        }

        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_notifies_on_each_flip() {
        // false -> true -> false across three polls: exactly two
        // callbacks, payloads true then false
        let provider = FakeProvider::script(&[false, true, false], false);
        let (monitor, _session) = monitor_with(provider);
        let seen = record_notifications(&monitor);

        for _ in 0..3 {
            monitor.poll_once().await;
        }

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_skips_cycle_while_busy() {
        let provider = FakeProvider::always_ok();
        let (monitor, session) = monitor_with(provider.clone());

        let _guard = session.begin_job();
        monitor.poll_once().await;

        assert_eq!(provider.opens(), 0);
    }

    #[tokio::test]
    async fn test_transition_invalidates_cached_handle() {
        let provider = FakeProvider::script(&[true, false], false);
        let (monitor, session) = monitor_with(provider);

        monitor.poll_once().await;
        session.lock().await.initialized = true;

        // Probe flips to false: the stale handle must be discarded
        monitor.poll_once().await;
        assert!(!session.lock().await.initialized);
    }

    #[tokio::test]
    async fn test_force_check_always_notifies() {
        let (monitor, _session) = monitor_with(FakeProvider::always_ok());
        let seen = record_notifications(&monitor);

        assert!(monitor.force_check().await);
        assert!(monitor.force_check().await);

        // Second check had no transition but still notified
        assert_eq!(*seen.lock().unwrap(), vec![true, true]);
    }

    #[tokio::test]
    async fn test_force_check_while_busy_skips_probe() {
        // A forced check arriving mid-job must not open a competing
        // handle or overwrite the known-good availability
        let provider = FakeProvider::always_ok();
        let (monitor, session) = monitor_with(provider.clone());
        monitor.poll_once().await;
        let seen = record_notifications(&monitor);
        let probes = provider.opens();

        let _guard = session.begin_job();
        assert!(monitor.force_check().await);

        assert_eq!(provider.opens(), probes);
        assert!(session.last_known_available());
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn test_panicking_callback_is_isolated() {
        let (monitor, _session) = monitor_with(FakeProvider::always_ok());

        monitor.subscribe(|_| panic!("subscriber blew up"));
        let seen = record_notifications(&monitor);

        monitor.force_check().await;
        monitor.force_check().await;

        assert_eq!(*seen.lock().unwrap(), vec![true, true]);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let (monitor, _session) = monitor_with(FakeProvider::always_ok());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = monitor.subscribe(move |available| sink.lock().unwrap().push(available));

        monitor.unsubscribe(id);
        monitor.force_check().await;

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (monitor, _session) = monitor_with(FakeProvider::always_ok());
        let handle = monitor.start();

        monitor.shutdown();
        monitor.shutdown();
        handle.await.unwrap();
    }
}
