//! # comanda-client
//!
//! Backend channel client for the printer agent.
//!
//! Maintains one persistent channel to the order backend, scoped to a
//! restaurant: inbound print requests flow to the session core in
//! `comanda-printer`, job outcomes and live availability flow back.
//!
//! ## Modules
//! - `transport`: framed wire transports (TCP, in-memory)
//! - `client`: connection lifecycle, job dispatch, outcome reporting
//! - `broadcaster`: periodic and transition-driven status reports

pub mod broadcaster;
pub mod client;
pub mod error;
pub mod transport;

pub use broadcaster::{StatusBroadcaster, StatusSink};
pub use client::{ChannelConfig, ConnectionState, PrinterChannel};
pub use error::{MessageError, MessageResult};
pub use transport::{Connector, MemoryConnector, MemoryTransport, TcpConnector, TcpTransport, Transport};
