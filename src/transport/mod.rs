//! Transport layer for module communication.
//!
//! This module provides the byte-level abstraction the driver polls:
//! a non-blocking availability query, single-byte reads, writes and flush.

pub mod mock;
pub mod serial;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::error::Result;

/// Trait for transport implementations.
pub trait Transport: Send {
    /// Opens the link at the given baud rate, reopening it if already open.
    fn open(&mut self, baud_rate: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Closes the link.
    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Returns the number of bytes that can be read without waiting.
    fn available(&mut self) -> Result<usize>;

    /// Reads one byte. Only called after [`Transport::available`] reported data.
    fn read_byte(&mut self) -> Pin<Box<dyn Future<Output = Result<u8>> + Send + '_>>;

    /// Writes data to the link.
    fn write(&mut self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Waits until all written data has been transmitted.
    fn flush(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Returns true if open.
    fn is_open(&self) -> bool;
}

pub use mock::MockTransport;
pub use serial::SerialTransport;
