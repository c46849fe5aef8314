//! Framed transports for the backend channel
//!
//! Wire frame: event type (1 byte), payload length (4 bytes LE), then
//! the JSON payload. [`MemoryTransport`] speaks the same message type
//! over in-process channels for tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast};

use crate::error::MessageError;
use shared::message::{ChannelMessage, EventType};

/// Maximum accepted payload size; anything larger is a corrupt frame
const MAX_PAYLOAD_LEN: usize = 4 * 1024 * 1024;

/// Transport abstraction for channel communication
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_message(&self) -> Result<ChannelMessage, MessageError>;
    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), MessageError>;
    async fn close(&self) -> Result<(), MessageError>;
}

/// Factory for transports, one per connection attempt
///
/// The channel reconnects by asking its connector for a fresh transport;
/// the previous one is dropped.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Transport>, MessageError>;
}

/// TCP Transport Implementation
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, MessageError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| MessageError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> Result<ChannelMessage, MessageError> {
        let mut reader = self.reader.lock().await;

        // Read event type (1 byte)
        let mut type_buf = [0u8; 1];
        reader
            .read_exact(&mut type_buf)
            .await
            .map_err(MessageError::Io)?;

        let event_type = EventType::try_from(type_buf[0])
            .map_err(|_| MessageError::InvalidMessage("Invalid event type".into()))?;

        // Read payload length (4 bytes)
        let mut len_buf = [0u8; 4];
        reader
            .read_exact(&mut len_buf)
            .await
            .map_err(MessageError::Io)?;

        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_PAYLOAD_LEN {
            return Err(MessageError::InvalidMessage(format!(
                "Payload length {} exceeds limit",
                len
            )));
        }

        // Read payload
        let mut payload = vec![0u8; len];
        reader
            .read_exact(&mut payload)
            .await
            .map_err(MessageError::Io)?;

        Ok(ChannelMessage {
            event_type,
            payload,
        })
    }

    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), MessageError> {
        let mut writer = self.writer.lock().await;
        let mut data = Vec::with_capacity(5 + msg.payload.len());
        data.push(msg.event_type as u8);
        data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&msg.payload);

        writer.write_all(&data).await.map_err(MessageError::Io)?;
        writer.flush().await.map_err(MessageError::Io)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), MessageError> {
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
        Ok(())
    }
}

/// Connector producing plain TCP transports
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, MessageError> {
        let transport = TcpTransport::connect(&self.addr).await?;
        Ok(Box::new(transport))
    }
}

/// Memory Transport Implementation (for In-Process communication)
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Receiver for messages FROM the backend
    rx: Arc<Mutex<broadcast::Receiver<ChannelMessage>>>,
    /// Sender for messages TO the backend
    tx: broadcast::Sender<ChannelMessage>,
}

impl MemoryTransport {
    /// Create a new memory transport
    ///
    /// # Arguments
    /// * `backend_tx` - The backend's broadcast sender (to subscribe to events)
    /// * `client_tx` - The channel carrying messages TO the backend
    pub fn new(
        backend_tx: &broadcast::Sender<ChannelMessage>,
        client_tx: &broadcast::Sender<ChannelMessage>,
    ) -> Self {
        Self {
            rx: Arc::new(Mutex::new(backend_tx.subscribe())),
            tx: client_tx.clone(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<ChannelMessage, MessageError> {
        let mut rx = self.rx.lock().await;
        rx.recv()
            .await
            .map_err(|e| MessageError::Connection(format!("Memory channel error: {}", e)))
    }

    async fn write_message(&self, msg: &ChannelMessage) -> Result<(), MessageError> {
        self.tx
            .send(msg.clone())
            .map_err(|e| MessageError::Connection(format!("Failed to send to backend: {}", e)))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), MessageError> {
        Ok(())
    }
}

/// Connector producing memory transports over a shared channel pair
pub struct MemoryConnector {
    backend_tx: broadcast::Sender<ChannelMessage>,
    client_tx: broadcast::Sender<ChannelMessage>,
}

impl MemoryConnector {
    pub fn new(
        backend_tx: &broadcast::Sender<ChannelMessage>,
        client_tx: &broadcast::Sender<ChannelMessage>,
    ) -> Self {
        Self {
            backend_tx: backend_tx.clone(),
            client_tx: client_tx.clone(),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, MessageError> {
        Ok(Box::new(MemoryTransport::new(
            &self.backend_tx,
            &self.client_tx,
        )))
    }
}
