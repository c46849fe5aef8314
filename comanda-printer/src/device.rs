//! Device adapters for the physical printer
//!
//! The session core only sees the [`Device`] trait: open, write raw
//! bytes, close. [`NetworkDevice`] drives a thermal printer over raw TCP
//! (port 9100); tests substitute scripted fakes.

use crate::error::{PrintError, PrintResult};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument};

/// A handle to the physical printer
///
/// `open` may be called only while no other open handle to the same
/// device is outstanding from this process; the session enforces that.
#[async_trait]
pub trait Device: Send + Sync {
    /// Open the device connection
    async fn open(&mut self) -> PrintResult<()>;

    /// Send raw print data to the device
    async fn write(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Close the device connection
    async fn close(&mut self) -> PrintResult<()>;
}

/// Constructs fresh device handles
///
/// The monitor uses it for short-lived probes; the executor for the
/// session's cached handle. Handles are replaced, never mutated.
pub trait DeviceProvider: Send + Sync {
    fn device(&self) -> Box<dyn Device>;
}

/// Network printer device (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100.
pub struct NetworkDevice {
    addr: SocketAddr,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl NetworkDevice {
    /// Create from a socket address string (e.g., "192.168.1.100:9100")
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
            stream: None,
        })
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the printer address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Device for NetworkDevice {
    #[instrument(skip(self), fields(addr = %self.addr))]
    async fn open(&mut self) -> PrintResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Unavailable(format!("{}: {}", self.addr, e)))?;

        info!("Printer connection opened");
        self.stream = Some(stream);
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| PrintError::Unavailable("Device not open".to_string()))?;

        stream.write_all(data).await.map_err(|e| {
            PrintError::Io(std::io::Error::new(
                e.kind(),
                format!("Write failed: {}", e),
            ))
        })?;

        stream.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> PrintResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        Ok(())
    }
}

/// Provider for [`NetworkDevice`] handles
#[derive(Debug, Clone)]
pub struct NetworkDeviceProvider {
    addr: SocketAddr,
    open_timeout: Duration,
}

impl NetworkDeviceProvider {
    pub fn new(addr: &str) -> PrintResult<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr)))?;

        Ok(Self {
            addr,
            open_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }
}

impl DeviceProvider for NetworkDeviceProvider {
    fn device(&self) -> Box<dyn Device> {
        Box::new(NetworkDevice {
            addr: self.addr,
            timeout: self.open_timeout,
            stream: None,
        })
    }
}
