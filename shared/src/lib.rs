//! Shared types for the comanda printer bridge
//!
//! Wire message types exchanged with the ordering backend and the
//! order/restaurant model fragments carried inside print job payloads.

pub mod message;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Channel message re-exports (for convenient access)
pub use message::{ChannelMessage, EventType};
