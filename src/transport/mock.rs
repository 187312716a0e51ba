//! In-memory transport for exercising the driver without hardware.
//!
//! A `MockTransport` holds a queue of bytes the "module" will send, a log of
//! everything written to it, and optional scripted replies that are queued
//! when a matching command is written.
//!
//! ```
//! use btshield::transport::{MockTransport, Transport};
//!
//! let mut transport = MockTransport::new();
//! transport.reply_on(b"+INQ=1", b"\r\n+RTINQ=aa,bb,cc,dd,ee,ff;peer\r\n");
//! assert_eq!(transport.available().unwrap(), 0);
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::protocol::buffer::find_from;
use crate::transport::Transport;

#[derive(Debug, Default)]
struct MockState {
    read_queue: VecDeque<u8>,
    writes: Vec<Bytes>,
    replies: VecDeque<(Vec<u8>, Vec<u8>)>,
    baud_rate: Option<u32>,
    open: bool,
    flushes: usize,
    empty_polls: usize,
}

/// Scripted transport.
///
/// Clones share state, so a test can keep a handle after moving the
/// transport into a driver.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates an open mock transport with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                open: true,
                ..MockState::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues bytes for the driver to read.
    pub fn enqueue_read(&self, data: &[u8]) {
        self.state().read_queue.extend(data);
    }

    /// Queues `reply` once a write containing `trigger` is seen.
    ///
    /// Replies fire in registration order, each at most once.
    pub fn reply_on(&self, trigger: &[u8], reply: &[u8]) {
        self.state()
            .replies
            .push_back((trigger.to_vec(), reply.to_vec()));
    }

    /// Returns every write in order.
    #[must_use]
    pub fn writes(&self) -> Vec<Bytes> {
        self.state().writes.clone()
    }

    /// Returns all written bytes concatenated.
    #[must_use]
    pub fn written(&self) -> Bytes {
        let state = self.state();
        let mut all = BytesMut::new();
        for write in &state.writes {
            all.extend_from_slice(write);
        }
        all.freeze()
    }

    /// Returns how many writes were exactly `data`.
    #[must_use]
    pub fn count_writes(&self, data: &[u8]) -> usize {
        self.state()
            .writes
            .iter()
            .filter(|w| w.as_ref() == data)
            .count()
    }

    /// Clears the write log.
    pub fn clear_writes(&self) {
        self.state().writes.clear();
    }

    /// Returns the baud rate of the last `open`.
    #[must_use]
    pub fn baud_rate(&self) -> Option<u32> {
        self.state().baud_rate
    }

    /// Returns how many times `flush` was called.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.state().flushes
    }

    /// Returns how many `available` calls found nothing to read.
    #[must_use]
    pub fn empty_polls(&self) -> usize {
        self.state().empty_polls
    }

    /// Returns the number of queued, unread bytes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state().read_queue.len()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, baud_rate: u32) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state();
            state.baud_rate = Some(baud_rate);
            state.open = true;
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.state().open = false;
            Ok(())
        })
    }

    fn available(&mut self) -> Result<usize> {
        let mut state = self.state();
        if !state.open {
            return Err(Error::NotConnected);
        }
        let pending = state.read_queue.len();
        if pending == 0 {
            state.empty_polls += 1;
        }
        Ok(pending)
    }

    fn read_byte(&mut self) -> Pin<Box<dyn Future<Output = Result<u8>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state();
            if !state.open {
                return Err(Error::NotConnected);
            }
            state.read_queue.pop_front().ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::WouldBlock,
                    "no data queued",
                ))
            })
        })
    }

    fn write(&mut self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state();
            if !state.open {
                return Err(Error::NotConnected);
            }

            let fired = state
                .replies
                .iter()
                .position(|(trigger, _)| find_from(&data, trigger, 0).is_some());
            if let Some((_, reply)) = fired.and_then(|index| state.replies.remove(index)) {
                state.read_queue.extend(reply);
            }

            state.writes.push(data);
            Ok(())
        })
    }

    fn flush(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.state().flushes += 1;
            Ok(())
        })
    }

    fn is_open(&self) -> bool {
        self.state().open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_and_read() {
        let mut transport = MockTransport::new();
        transport.enqueue_read(b"ok");

        assert_eq!(transport.available().unwrap(), 2);
        assert_eq!(transport.read_byte().await.unwrap(), b'o');
        assert_eq!(transport.read_byte().await.unwrap(), b'k');
        assert_eq!(transport.available().unwrap(), 0);
        assert_eq!(transport.empty_polls(), 1);
    }

    #[tokio::test]
    async fn test_reply_on_fires_once() {
        let mut transport = MockTransport::new();
        transport.reply_on(b"+INQ=1", b"reply");

        transport.write(Bytes::from_static(b"\r\n+INQ=1\r\n")).await.unwrap();
        transport.write(Bytes::from_static(b"\r\n+INQ=1\r\n")).await.unwrap();

        assert_eq!(transport.pending(), 5);
        assert_eq!(transport.count_writes(b"\r\n+INQ=1\r\n"), 2);
    }

    #[tokio::test]
    async fn test_closed_transport_rejects_io() {
        let mut transport = MockTransport::new();
        let handle = transport.clone();
        transport.close().await.unwrap();

        assert!(!handle.is_open());
        assert!(matches!(transport.available(), Err(Error::NotConnected)));

        transport.open(9600).await.unwrap();
        assert_eq!(handle.baud_rate(), Some(9600));
        assert!(transport.write(Bytes::from_static(b"x")).await.is_ok());
        assert_eq!(&handle.written()[..], b"x");
    }
}
