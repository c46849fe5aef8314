//! Print job executor
//!
//! Performs exactly one print attempt against the physical device,
//! end-to-end, with hard time bounds. Retrying is the caller's business
//! (see [`crate::retry`]).

use crate::device::{Device, DeviceProvider};
use crate::error::{PrintError, PrintResult};
use crate::job::PrintJob;
use crate::session::{PrinterSession, SessionInner};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Content generation collaborator
///
/// Given an opened device and a job payload, produce the full print
/// sequence (text blocks, images, barcode, cut). The executor has no
/// opinion on layout; renderer failures for essential content surface
/// as [`PrintError::Render`].
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, device: &mut dyn Device, job: &PrintJob) -> PrintResult<()>;
}

/// Print job executor
///
/// Owns no state of its own; all device state lives in the session.
pub struct PrintExecutor {
    session: Arc<PrinterSession>,
    provider: Arc<dyn DeviceProvider>,
    renderer: Arc<dyn Renderer>,
}

impl PrintExecutor {
    pub fn new(
        session: Arc<PrinterSession>,
        provider: Arc<dyn DeviceProvider>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            session,
            provider,
            renderer,
        }
    }

    /// Execute one print attempt
    ///
    /// Sets the session busy for the whole call, reuses the cached
    /// device handle when it is still trusted, and enforces the job
    /// kind's wall-clock timeout around the open+render sequence. Every
    /// failure path invalidates the cached handle.
    #[instrument(skip(self, job), fields(kind = job.kind.as_str(), attempt = job.attempt))]
    pub async fn execute(&self, job: &PrintJob) -> PrintResult<()> {
        let _busy = self.session.begin_job();
        let mut inner = self.session.lock().await;

        match tokio::time::timeout(job.kind.timeout(), self.run_attempt(&mut inner, job)).await {
            Ok(Ok(())) => {
                info!("Print attempt succeeded");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Print attempt failed");
                inner.reset().await;
                Err(e)
            }
            Err(_) => {
                warn!("Print attempt timed out");
                inner.reset().await;
                Err(PrintError::Timeout(format!(
                    "{} job exceeded {:?}",
                    job.kind.as_str(),
                    job.kind.timeout()
                )))
            }
        }
    }

    async fn run_attempt(&self, inner: &mut SessionInner, job: &PrintJob) -> PrintResult<()> {
        if !inner.initialized || inner.device.is_none() {
            let mut device = self.provider.device();
            device.open().await?;
            inner.device = Some(device);
            inner.initialized = true;
        }

        let device = inner
            .device
            .as_mut()
            .ok_or_else(|| PrintError::Unavailable("No device handle".to_string()))?;

        self.renderer.render(device.as_mut(), job).await
    }
}
