use serde::{Deserialize, Serialize};

use crate::models::{Order, Restaurant, Table};

// ==================== Inbound payloads ====================

/// printOrder payload (backend -> agent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOrderPayload {
    pub order: Order,
    pub restaurant: Restaurant,
}

/// printQRCode payload (backend -> agent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintQrCodePayload {
    pub url: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub restaurant: Option<Restaurant>,
    pub table: Option<Table>,
    pub session_id: Option<String>,
}

// ==================== Outbound payloads ====================

/// joinPrinter payload (agent -> backend), sent once per successful connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPrinterPayload {
    pub restaurant_id: String,
}

/// printerStatus payload - availability heartbeat, fire-and-forget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterStatusPayload {
    pub restaurant_id: String,
    pub available: bool,
    /// Unix epoch millis
    pub timestamp: i64,
}

/// printerError payload - job-level failure report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterErrorPayload {
    pub restaurant_id: String,
    pub error: String,
    /// Set for receipt jobs
    pub order_id: Option<String>,
    /// Set for QR code jobs
    pub url: Option<String>,
    pub details: Option<String>,
}

/// printResult payload - job outcome report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResultPayload {
    pub success: bool,
    pub order_id: Option<String>,
    /// "receipt" or "qrcode"
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub message: String,
}

impl PrintResultPayload {
    pub fn receipt_ok(order_id: &str) -> Self {
        Self {
            success: true,
            order_id: Some(order_id.to_string()),
            job_type: Some("receipt".to_string()),
            message: "printed".to_string(),
        }
    }

    pub fn qr_ok() -> Self {
        Self {
            success: true,
            order_id: None,
            job_type: Some("qrcode".to_string()),
            message: "printed".to_string(),
        }
    }

    pub fn failed(order_id: Option<String>, job_type: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id,
            job_type: Some(job_type.to_string()),
            message: message.into(),
        }
    }
}
