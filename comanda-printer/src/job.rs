//! Print job types

use shared::message::{PrintOrderPayload, PrintQrCodePayload};
use std::time::Duration;

/// What kind of output a job produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Receipt,
    QrCode,
}

impl JobKind {
    /// Wall-clock bound for one attempt: open + render + cut + close
    pub fn timeout(&self) -> Duration {
        match self {
            JobKind::Receipt => Duration::from_secs(30),
            JobKind::QrCode => Duration::from_secs(15),
        }
    }

    /// Wire name used in printResult messages
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Receipt => "receipt",
            JobKind::QrCode => "qrcode",
        }
    }
}

/// Job content, opaque to the session core - handed to the renderer
#[derive(Debug, Clone)]
pub enum JobPayload {
    Receipt(PrintOrderPayload),
    QrCode(PrintQrCodePayload),
}

/// One unit of print work
///
/// Created when a job message arrives over the channel; dropped when it
/// terminates. Not persisted - a crash loses in-flight jobs.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub kind: JobKind,
    pub payload: JobPayload,
    /// Unix epoch millis
    pub submitted_at: i64,
    pub attempt: u32,
}

impl PrintJob {
    pub fn receipt(payload: PrintOrderPayload) -> Self {
        Self {
            kind: JobKind::Receipt,
            payload: JobPayload::Receipt(payload),
            submitted_at: chrono::Utc::now().timestamp_millis(),
            attempt: 0,
        }
    }

    pub fn qr_code(payload: PrintQrCodePayload) -> Self {
        Self {
            kind: JobKind::QrCode,
            payload: JobPayload::QrCode(payload),
            submitted_at: chrono::Utc::now().timestamp_millis(),
            attempt: 0,
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    /// Order identity for receipt jobs
    pub fn order_id(&self) -> Option<&str> {
        match &self.payload {
            JobPayload::Receipt(p) => Some(p.order.id.as_str()),
            JobPayload::QrCode(_) => None,
        }
    }

    /// Target URL for QR jobs
    pub fn url(&self) -> Option<&str> {
        match &self.payload {
            JobPayload::Receipt(_) => None,
            JobPayload::QrCode(p) => Some(p.url.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_timeouts() {
        assert_eq!(JobKind::Receipt.timeout(), Duration::from_secs(30));
        assert_eq!(JobKind::QrCode.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_job_identity() {
        let job = PrintJob::qr_code(PrintQrCodePayload {
            url: "https://menu.example/t/1".to_string(),
            title: None,
            subtitle: None,
            restaurant: None,
            table: None,
            session_id: None,
        });

        assert_eq!(job.kind, JobKind::QrCode);
        assert_eq!(job.url(), Some("https://menu.example/t/1"));
        assert!(job.order_id().is_none());
    }
}
