//! Channel message types
//!
//! Shared between the printer agent and the ordering backend, used over
//! the persistent TCP channel and the in-process (memory) transport.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod payload;
pub use payload::*;

/// Channel event types
///
/// The `u8` values are the on-wire event tags; they must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Scope this connection to a restaurant
    JoinPrinter = 0,
    /// Backend requests a receipt print
    PrintOrder = 1,
    /// Backend requests a QR code print
    PrintQrCode = 2,
    /// Backend asks for the current printer status
    CheckPrinterStatus = 3,
    /// Backend asks for a fresh (non-cached) probe
    ForcePrinterStatusCheck = 4,
    /// Availability heartbeat / transition report
    PrinterStatus = 5,
    /// Job-level error report
    PrinterError = 6,
    /// Job outcome report
    PrintResult = 7,
}

impl TryFrom<u8> for EventType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::JoinPrinter),
            1 => Ok(EventType::PrintOrder),
            2 => Ok(EventType::PrintQrCode),
            3 => Ok(EventType::CheckPrinterStatus),
            4 => Ok(EventType::ForcePrinterStatusCheck),
            5 => Ok(EventType::PrinterStatus),
            6 => Ok(EventType::PrinterError),
            7 => Ok(EventType::PrintResult),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::JoinPrinter => write!(f, "joinPrinter"),
            EventType::PrintOrder => write!(f, "printOrder"),
            EventType::PrintQrCode => write!(f, "printQRCode"),
            EventType::CheckPrinterStatus => write!(f, "checkPrinterStatus"),
            EventType::ForcePrinterStatusCheck => write!(f, "forcePrinterStatusCheck"),
            EventType::PrinterStatus => write!(f, "printerStatus"),
            EventType::PrinterError => write!(f, "printerError"),
            EventType::PrintResult => write!(f, "printResult"),
        }
    }
}

/// Channel message body
///
/// The payload is the JSON-encoded event payload; empty for events that
/// carry none (`checkPrinterStatus`, `forcePrinterStatusCheck`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

impl ChannelMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// Create an event without a payload
    pub fn empty(event_type: EventType) -> Self {
        Self::new(event_type, Vec::new())
    }

    /// Create a joinPrinter message
    pub fn join_printer(payload: &JoinPrinterPayload) -> Self {
        Self::new(
            EventType::JoinPrinter,
            serde_json::to_vec(payload).expect("Failed to serialize join payload"),
        )
    }

    /// Create a printerStatus message
    pub fn printer_status(payload: &PrinterStatusPayload) -> Self {
        Self::new(
            EventType::PrinterStatus,
            serde_json::to_vec(payload).expect("Failed to serialize status payload"),
        )
    }

    /// Create a printerError message
    pub fn printer_error(payload: &PrinterErrorPayload) -> Self {
        Self::new(
            EventType::PrinterError,
            serde_json::to_vec(payload).expect("Failed to serialize error payload"),
        )
    }

    /// Create a printResult message
    pub fn print_result(payload: &PrintResultPayload) -> Self {
        Self::new(
            EventType::PrintResult,
            serde_json::to_vec(payload).expect("Failed to serialize result payload"),
        )
    }

    /// Create a printOrder message
    pub fn print_order(payload: &PrintOrderPayload) -> Self {
        Self::new(
            EventType::PrintOrder,
            serde_json::to_vec(payload).expect("Failed to serialize order payload"),
        )
    }

    /// Create a printQRCode message
    pub fn print_qr_code(payload: &PrintQrCodePayload) -> Self {
        Self::new(
            EventType::PrintQrCode,
            serde_json::to_vec(payload).expect("Failed to serialize QR payload"),
        )
    }

    /// Parse the payload as the given type
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
