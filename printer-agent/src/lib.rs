//! Printer agent - bridges the order backend to a receipt printer
//!
//! Wires the three layers together:
//! - `comanda-printer`: device session, availability, retries
//! - `comanda-client`: backend channel, job dispatch, status reports
//! - this crate: configuration, logging, receipt rendering, lifecycle

pub mod config;
pub mod logger;
pub mod render;

pub use config::AgentConfig;
pub use logger::{init_logger, init_logger_with_file};
pub use render::{BasicRenderer, TicketBuilder};
