//! # comanda-printer
//!
//! Printer session management - device availability and job execution.
//!
//! ## Scope
//!
//! This crate handles the relationship with one physical printer:
//! - Device abstraction (network port 9100, test fakes)
//! - Session state: the single cached device handle and the busy flag
//! - Availability monitoring with transition-only notification
//! - Single print attempts with hard time bounds
//! - Bounded exponential-backoff retries with device reset in between
//!
//! What gets printed (receipt layout, QR images) stays in application
//! code behind the [`Renderer`] trait; channel communication with the
//! backend lives in `comanda-client`.
//!
//! ## Example
//!
//! ```ignore
//! use comanda_printer::{
//!     AvailabilityMonitor, NetworkDeviceProvider, PrintExecutor, PrinterSession,
//!     RetryPolicy, retry::run_with_retry,
//! };
//!
//! let session = Arc::new(PrinterSession::new());
//! let provider = Arc::new(NetworkDeviceProvider::new("192.168.1.100:9100")?);
//! let monitor = Arc::new(AvailabilityMonitor::new(session.clone(), provider.clone()));
//! monitor.start();
//!
//! let executor = PrintExecutor::new(session.clone(), provider, renderer);
//! let outcome = run_with_retry(RetryPolicy::default(), &session, |attempt| {
//!     executor.execute(&job.with_attempt(attempt))
//! })
//! .await;
//! ```

mod device;
mod error;
mod executor;
mod job;
pub mod monitor;
pub mod retry;
mod session;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use device::{Device, DeviceProvider, NetworkDevice, NetworkDeviceProvider};
pub use error::{PrintError, PrintResult};
pub use executor::{PrintExecutor, Renderer};
pub use job::{JobKind, JobPayload, PrintJob};
pub use monitor::{AvailabilityMonitor, SubscriptionId};
pub use retry::{RetryPolicy, run_with_retry};
pub use session::PrinterSession;
