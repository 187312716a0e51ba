//! Serial/UART transport implementation.
//!
//! This module provides serial port communication for modules wired to a
//! host UART or a USB serial adapter.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::BaudRate;

/// Default baud rate for the module (factory setting).
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// Default delay after opening the port before the first command.
pub const DEFAULT_OPEN_DELAY: Duration = Duration::from_millis(100);

/// Configuration for serial transport.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0" or "COM3").
    pub port: String,
    /// Baud rate used until [`Transport::open`] is given another one.
    pub baud_rate: u32,
    /// Delay after opening before the port is used.
    pub open_delay: Duration,
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            open_delay: DEFAULT_OPEN_DELAY,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: BaudRate) -> Self {
        self.baud_rate = rate.as_u32();
        self
    }

    /// Sets the open delay.
    #[must_use]
    pub const fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }
}

/// Serial transport for module communication.
pub struct SerialTransport {
    config: SerialConfig,
    stream: Option<SerialStream>,
}

impl SerialTransport {
    /// Creates a new serial transport with the given configuration.
    #[must_use]
    pub const fn new(config: SerialConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Creates a new serial transport for the given port with default settings.
    #[must_use]
    pub fn with_port(port: impl Into<String>) -> Self {
        Self::new(SerialConfig::new(port))
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn stream_mut(&mut self) -> Result<&mut SerialStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, baud_rate: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.stream.take().is_some() {
                tracing::debug!("reopening serial port: {}", self.config.port);
            }

            tracing::info!(
                "opening serial port {} at {} baud",
                self.config.port,
                baud_rate
            );

            let stream = tokio_serial::new(&self.config.port, baud_rate)
                .open_native_async()
                .map_err(Error::Serial)?;

            tokio::time::sleep(self.config.open_delay).await;

            self.config.baud_rate = baud_rate;
            self.stream = Some(stream);
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut stream) = self.stream.take() {
                tracing::info!("closing serial port: {}", self.config.port);
                stream.flush().await.map_err(Error::Io)?;
            }
            Ok(())
        })
    }

    fn available(&mut self) -> Result<usize> {
        let stream = self.stream_mut()?;
        let pending = tokio_serial::SerialPort::bytes_to_read(stream).map_err(Error::Serial)?;
        Ok(pending as usize)
    }

    fn read_byte(&mut self) -> Pin<Box<dyn Future<Output = Result<u8>> + Send + '_>> {
        Box::pin(async move {
            let stream = self.stream_mut()?;
            let byte = stream.read_u8().await.map_err(Error::Io)?;
            tracing::trace!("received byte 0x{byte:02x}");
            Ok(byte)
        })
    }

    fn write(&mut self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let stream = self.stream_mut()?;
            tracing::trace!("writing {} bytes", data.len());
            stream.write_all(&data).await.map_err(Error::Io)
        })
    }

    fn flush(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let stream = self.stream_mut()?;
            stream.flush().await.map_err(Error::Io)
        })
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

/// Lists available serial ports.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::Serial)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
