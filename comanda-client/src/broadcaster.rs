//! Live printer status broadcasting
//!
//! One broadcaster run per connection epoch: it settles briefly after
//! the channel join, forces a fresh probe, then keeps the backend
//! current through transition events and a periodic heartbeat. Forced
//! probes always notify monitor subscribers, so every emission funnels
//! through the same subscription and no status is reported twice.

use crate::error::MessageError;
use async_trait::async_trait;
use chrono::Utc;
use comanda_printer::AvailabilityMonitor;
use shared::message::PrinterStatusPayload;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

/// Outbound destination for status payloads
///
/// Implemented by the channel client; sends are best-effort and must
/// not fail the broadcaster.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn emit_status(&self, payload: PrinterStatusPayload) -> Result<(), MessageError>;
}

/// Printer status broadcaster
pub struct StatusBroadcaster {
    monitor: Arc<AvailabilityMonitor>,
    sink: Arc<dyn StatusSink>,
    settle_delay: Duration,
    heartbeat_interval: Duration,
}

impl StatusBroadcaster {
    pub fn new(monitor: Arc<AvailabilityMonitor>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            monitor,
            sink,
            settle_delay: DEFAULT_SETTLE_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Run until the connection epoch's token is cancelled
    ///
    /// The token belongs to the connection that spawned this run; a
    /// reconnect cancels it and starts a fresh run.
    pub fn start(
        self: Arc<Self>,
        restaurant_id: String,
        token: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(restaurant_id, token).await })
    }

    async fn run(&self, restaurant_id: String, token: CancellationToken) {
        info!(restaurant_id = %restaurant_id, "Status broadcaster started");

        // Availability transitions land here from the monitor thread
        let (status_tx, mut status_rx) = mpsc::unbounded_channel::<bool>();
        let subscription = self.monitor.subscribe(move |available| {
            let _ = status_tx.send(available);
        });

        // Initial report: let the join settle, then probe fresh
        tokio::select! {
            _ = token.cancelled() => {
                self.monitor.unsubscribe(subscription);
                return;
            }
            _ = tokio::time::sleep(self.settle_delay) => {}
        }
        // force_check notifies subscribers, including this run's own
        // subscription, which performs the emit; while a job holds the
        // device it reports the last known value instead of probing
        self.monitor.force_check().await;

        let start = Instant::now() + self.heartbeat_interval;
        let mut heartbeat = interval_at(start, self.heartbeat_interval);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    break;
                }
                Some(available) = status_rx.recv() => {
                    self.emit(&restaurant_id, available).await;
                }
                _ = heartbeat.tick() => {
                    debug!("Status heartbeat");
                    self.monitor.force_check().await;
                }
            }
        }

        self.monitor.unsubscribe(subscription);
        info!(restaurant_id = %restaurant_id, "Status broadcaster stopped");
    }

    async fn emit(&self, restaurant_id: &str, available: bool) {
        let payload = PrinterStatusPayload {
            restaurant_id: restaurant_id.to_string(),
            available,
            timestamp: Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.sink.emit_status(payload).await {
            warn!(error = %e, "Failed to send printer status");
        }
    }
}
