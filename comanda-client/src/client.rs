//! Printer channel client
//!
//! One persistent channel to the backend per agent process. The client
//! owns the connection lifecycle (connect, read loop, reconnect with
//! backoff), scopes itself to a restaurant via joinPrinter, dispatches
//! inbound print requests to the session core, and reports outcomes
//! back. At most one job is in flight; one more may wait in the queue,
//! anything beyond that is rejected as busy.

use crate::broadcaster::{
    DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_SETTLE_DELAY, StatusBroadcaster, StatusSink,
};
use crate::error::MessageError;
use crate::transport::{Connector, Transport};
use async_trait::async_trait;
use comanda_printer::{
    AvailabilityMonitor, PrintExecutor, PrintJob, PrinterSession, RetryPolicy, run_with_retry,
};
use shared::message::{
    ChannelMessage, EventType, JoinPrinterPayload, PrintOrderPayload, PrintQrCodePayload,
    PrintResultPayload, PrinterErrorPayload, PrinterStatusPayload,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Channel connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Channel tuning knobs
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Backoff start after a failed connect or a lost connection
    pub reconnect_delay: Duration,
    /// Backoff ceiling
    pub max_reconnect_delay: Duration,
    /// Pause between channel join and the first status report
    pub settle_delay: Duration,
    /// Periodic status re-check cadence
    pub heartbeat_interval: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(500),
            max_reconnect_delay: Duration::from_secs(10),
            settle_delay: DEFAULT_SETTLE_DELAY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Printer channel client
///
/// Cheap to clone; all clones share the same connection and session.
#[derive(Clone)]
pub struct PrinterChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    connector: Arc<dyn Connector>,
    session: Arc<PrinterSession>,
    monitor: Arc<AvailabilityMonitor>,
    executor: Arc<PrintExecutor>,
    policy: RetryPolicy,
    config: ChannelConfig,
    state: Mutex<ConnectionState>,
    /// Restaurant this channel is scoped to, set by join_channel
    binding: Mutex<Option<String>>,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    job_tx: mpsc::Sender<PrintJob>,
    /// Broadcaster lifetime, one per connection epoch
    epoch: Mutex<Option<CancellationToken>>,
    /// Connection driver lifetime, created by connect
    run: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

impl PrinterChannel {
    pub fn new(
        connector: Arc<dyn Connector>,
        session: Arc<PrinterSession>,
        monitor: Arc<AvailabilityMonitor>,
        executor: Arc<PrintExecutor>,
        policy: RetryPolicy,
        config: ChannelConfig,
    ) -> Self {
        // Capacity 1: one job may wait behind the in-flight one
        let (job_tx, job_rx) = mpsc::channel(1);

        let inner = Arc::new(ChannelInner {
            connector,
            session,
            monitor,
            executor,
            policy,
            config,
            state: Mutex::new(ConnectionState::Disconnected),
            binding: Mutex::new(None),
            transport: Mutex::new(None),
            job_tx,
            epoch: Mutex::new(None),
            run: Mutex::new(None),
            shutdown: CancellationToken::new(),
        });

        let worker = inner.clone();
        tokio::spawn(async move { worker.job_worker(job_rx).await });

        Self { inner }
    }

    /// Start connecting; returns immediately, reconnects forever
    ///
    /// Safe to call repeatedly; while a driver is running this is a
    /// no-op.
    pub fn connect(&self) {
        let mut run = self.inner.run.lock().unwrap();
        if run.is_some() {
            debug!("Channel already connecting or connected");
            return;
        }

        let token = self.inner.shutdown.child_token();
        *run = Some(token.clone());

        let inner = self.inner.clone();
        tokio::spawn(async move { inner.drive_connection(token).await });
    }

    /// Scope this channel to a restaurant
    ///
    /// If the channel is not connected yet the join is announced on the
    /// next successful connect; reconnects re-announce it.
    pub async fn join_channel(&self, restaurant_id: &str) {
        *self.inner.binding.lock().unwrap() = Some(restaurant_id.to_string());
        if self.state() == ConnectionState::Connected {
            self.inner.announce_join().await;
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock().unwrap()
    }

    /// Stop the connection driver and broadcaster; idempotent
    ///
    /// The restaurant binding survives, so a later connect re-joins.
    pub async fn disconnect(&self) {
        let run = self.inner.run.lock().unwrap().take();
        if let Some(token) = run {
            token.cancel();
        }
        self.inner.stop_broadcaster();

        let transport = self.inner.transport.lock().unwrap().take();
        if let Some(transport) = transport {
            let _ = transport.close().await;
        }

        self.inner.set_state(ConnectionState::Disconnected);
        info!("Channel disconnected");
    }

    /// Disconnect and stop the job worker permanently
    pub async fn shutdown(&self) {
        self.disconnect().await;
        self.inner.shutdown.cancel();
    }
}

impl ChannelInner {
    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap() = state;
    }

    async fn send(&self, msg: ChannelMessage) -> Result<(), MessageError> {
        let transport = self.transport.lock().unwrap().clone();
        match transport {
            Some(transport) => transport.write_message(&msg).await,
            None => Err(MessageError::Connection("Not connected".to_string())),
        }
    }

    async fn drive_connection(self: Arc<Self>, token: CancellationToken) {
        let mut delay = self.config.reconnect_delay;

        loop {
            if token.is_cancelled() {
                break;
            }
            self.set_state(ConnectionState::Connecting);

            match self.connector.connect().await {
                Ok(transport) => {
                    let transport: Arc<dyn Transport> = Arc::from(transport);
                    *self.transport.lock().unwrap() = Some(transport.clone());
                    self.set_state(ConnectionState::Connected);
                    delay = self.config.reconnect_delay;
                    info!("Channel connected");

                    if self.binding.lock().unwrap().is_some() {
                        self.announce_join().await;
                    }

                    self.read_loop(&token, transport.as_ref()).await;
                    if token.is_cancelled() {
                        break;
                    }
                    self.on_connection_lost();
                }
                Err(e) => {
                    warn!(error = %e, "Channel connect failed");
                    self.set_state(ConnectionState::Disconnected);
                }
            }

            debug!(delay_ms = delay.as_millis() as u64, "Reconnect backoff");
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = (delay * 2).min(self.config.max_reconnect_delay);
        }
    }

    async fn read_loop(self: &Arc<Self>, token: &CancellationToken, transport: &dyn Transport) {
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                msg = transport.read_message() => match msg {
                    Ok(msg) => self.handle_inbound(msg).await,
                    Err(e) => {
                        warn!(error = %e, "Channel read failed");
                        return;
                    }
                }
            }
        }
    }

    fn on_connection_lost(&self) {
        self.set_state(ConnectionState::Disconnected);
        self.stop_broadcaster();
        *self.transport.lock().unwrap() = None;
    }

    async fn announce_join(self: &Arc<Self>) {
        let restaurant_id = match self.binding.lock().unwrap().clone() {
            Some(id) => id,
            None => return,
        };

        let payload = JoinPrinterPayload {
            restaurant_id: restaurant_id.clone(),
        };
        if let Err(e) = self.send(ChannelMessage::join_printer(&payload)).await {
            warn!(error = %e, "Failed to announce channel join");
            return;
        }
        info!(restaurant_id = %restaurant_id, "Joined printer channel");

        self.start_broadcaster(restaurant_id);
    }

    fn start_broadcaster(self: &Arc<Self>, restaurant_id: String) {
        let mut epoch = self.epoch.lock().unwrap();
        if let Some(old) = epoch.take() {
            old.cancel();
        }
        let token = self.shutdown.child_token();
        *epoch = Some(token.clone());

        let sink: Arc<dyn StatusSink> = self.clone();
        let broadcaster = Arc::new(
            StatusBroadcaster::new(self.monitor.clone(), sink)
                .with_settle_delay(self.config.settle_delay)
                .with_heartbeat_interval(self.config.heartbeat_interval),
        );
        broadcaster.start(restaurant_id, token);
    }

    fn stop_broadcaster(&self) {
        if let Some(token) = self.epoch.lock().unwrap().take() {
            token.cancel();
        }
    }

    async fn handle_inbound(self: &Arc<Self>, msg: ChannelMessage) {
        match msg.event_type {
            EventType::PrintOrder => match msg.parse_payload::<PrintOrderPayload>() {
                Ok(payload) => self.dispatch_job(PrintJob::receipt(payload)).await,
                Err(e) => warn!(error = %e, "Malformed printOrder payload"),
            },
            EventType::PrintQrCode => match msg.parse_payload::<PrintQrCodePayload>() {
                Ok(payload) => self.dispatch_job(PrintJob::qr_code(payload)).await,
                Err(e) => warn!(error = %e, "Malformed printQRCode payload"),
            },
            EventType::CheckPrinterStatus | EventType::ForcePrinterStatusCheck => {
                debug!("Status check requested");
                // Forced probes always notify; the broadcaster turns the
                // notification into an immediate printerStatus
                let monitor = self.monitor.clone();
                tokio::spawn(async move {
                    monitor.force_check().await;
                });
            }
            other => {
                debug!(event = %other, "Ignoring unexpected channel event");
            }
        }
    }

    /// Hand a job to the worker, or reject it on the spot
    async fn dispatch_job(self: &Arc<Self>, job: PrintJob) {
        if !self.session.last_known_available() {
            info!(kind = job.kind.as_str(), "Rejecting job, printer unavailable");
            self.report_failure(&job, "Printer is not available").await;
            return;
        }

        match self.job_tx.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(job)) => {
                info!(kind = job.kind.as_str(), "Rejecting job, queue full");
                self.report_failure(&job, "Printer is busy with another job")
                    .await;
            }
            Err(TrySendError::Closed(job)) => {
                warn!(kind = job.kind.as_str(), "Job worker stopped, dropping job");
            }
        }
    }

    async fn job_worker(self: Arc<Self>, mut job_rx: mpsc::Receiver<PrintJob>) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                job = job_rx.recv() => match job {
                    Some(job) => self.process_job(job).await,
                    None => break,
                }
            }
        }
        debug!("Job worker stopped");
    }

    async fn process_job(self: &Arc<Self>, job: PrintJob) {
        info!(
            kind = job.kind.as_str(),
            order_id = job.order_id().unwrap_or(""),
            "Processing print job"
        );

        let executor = self.executor.clone();
        let attempt_job = job.clone();
        let result = run_with_retry(self.policy, self.session.as_ref(), move |attempt| {
            let executor = executor.clone();
            let job = attempt_job.clone().with_attempt(attempt);
            async move { executor.execute(&job).await }
        })
        .await;

        match result {
            Ok(()) => self.report_success(&job).await,
            Err(e) => {
                self.report_failure(&job, &e.to_string()).await;
            }
        }
    }

    async fn report_success(&self, job: &PrintJob) {
        let payload = match job.order_id() {
            Some(order_id) => PrintResultPayload::receipt_ok(order_id),
            None => PrintResultPayload::qr_ok(),
        };
        if let Err(e) = self.send(ChannelMessage::print_result(&payload)).await {
            warn!(error = %e, "Failed to send print result");
        }
    }

    /// Report a failed or rejected job; send errors are logged only
    async fn report_failure(&self, job: &PrintJob, reason: &str) {
        let restaurant_id = self.binding.lock().unwrap().clone().unwrap_or_default();

        let error = PrinterErrorPayload {
            restaurant_id,
            error: reason.to_string(),
            order_id: job.order_id().map(str::to_string),
            url: job.url().map(str::to_string),
            details: None,
        };
        if let Err(e) = self.send(ChannelMessage::printer_error(&error)).await {
            warn!(error = %e, "Failed to send printer error");
        }

        let result =
            PrintResultPayload::failed(job.order_id().map(str::to_string), job.kind.as_str(), reason);
        if let Err(e) = self.send(ChannelMessage::print_result(&result)).await {
            warn!(error = %e, "Failed to send print result");
        }
    }
}

#[async_trait]
impl StatusSink for ChannelInner {
    async fn emit_status(&self, payload: PrinterStatusPayload) -> Result<(), MessageError> {
        self.send(ChannelMessage::printer_status(&payload)).await
    }
}
