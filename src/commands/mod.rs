//! Command handlers for module operations.
//!
//! This module provides the command sender and the response waits
//! (status, inquiry, connect, PIN request, raw receive). Every wait is
//! built on [`poll`], differing only in its predicate and side effects.

pub mod poll;

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::ModuleConfig;
use crate::error::Result;
use crate::protocol::{
    Command, FrameBuffer, MAX_DEVICE_NAME_LEN, Token, ends_with_link_error, inquiry_addresses,
    parse_status,
};
use crate::transport::Transport;
use crate::types::{ModuleStatus, RemoteAddress};

pub use poll::{PollMode, PollOutcome, RetryPolicy, Step, poll};

/// Data collected by a raw receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Every byte read, including the terminator when present.
    pub data: Bytes,
    /// True if the terminator was read, false if a link error cut the
    /// receive short.
    pub terminated: bool,
}

/// Command handler owning the transport and the accumulation buffer.
pub struct CommandHandler<T> {
    transport: T,
    buffer: FrameBuffer,
    config: ModuleConfig,
}

impl<T: Transport> CommandHandler<T> {
    /// Creates a new command handler.
    #[must_use]
    pub const fn new(transport: T, config: ModuleConfig) -> Self {
        Self {
            transport,
            buffer: FrameBuffer::new(),
            config,
        }
    }

    /// Returns the timing configuration.
    #[must_use]
    pub const fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Replaces the timing configuration.
    pub fn set_config(&mut self, config: ModuleConfig) {
        self.config = config;
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the transport mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns the accumulation buffer as left by the last wait.
    #[must_use]
    pub const fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Discards whatever the accumulation buffer holds.
    pub fn reset_buffer(&mut self) {
        self.buffer.reset();
    }

    /// Consumes the handler and returns the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    // ==================== Sending ====================

    /// Sends a batch of commands, then flushes and waits the settle delay once.
    pub async fn send_batch(&mut self, commands: &[Command<'_>]) -> Result<()> {
        for command in commands {
            let frame = command.encode();
            tracing::debug!("sending command: {:?}", String::from_utf8_lossy(&frame));
            self.transport.write(frame).await?;
        }
        self.transport.flush().await?;
        tokio::time::sleep(self.config.settle_delay).await;
        Ok(())
    }

    /// Sends a single command as its own batch.
    pub async fn send(&mut self, command: Command<'_>) -> Result<()> {
        self.send_batch(&[command]).await
    }

    /// Writes payload bytes and flushes.
    pub async fn send_raw(&mut self, data: Bytes) -> Result<()> {
        tracing::debug!("sending data: {:?}", String::from_utf8_lossy(&data));
        self.transport.write(data).await?;
        self.transport.flush().await
    }

    // ==================== Response Waits ====================

    /// Waits for a `+BTSTATE:` report and compares it with `wanted`.
    ///
    /// A report with any other code fails immediately; it is not retried.
    pub async fn wait_for_status(&mut self, wanted: ModuleStatus, mode: PollMode) -> Result<bool> {
        let outcome = poll(
            &mut self.transport,
            &mut self.buffer,
            self.config.status,
            mode,
            None,
            |buffer| match parse_status(buffer.as_bytes()) {
                None => Step::Pending,
                Some(code) if code == wanted.code() => Step::Matched(()),
                Some(code) => {
                    tracing::warn!("bad status: wanted {}, got {code}", wanted.code());
                    Step::Rejected
                }
            },
        )
        .await?;

        if outcome.is_matched() {
            tracing::info!("good status: {wanted:?}");
        }
        Ok(outcome.is_matched())
    }

    /// Runs an inquiry and returns the first device address reported.
    ///
    /// The result is settled as soon as the address delimiter arrives. The
    /// inquiry is then stopped. No stop command is sent when the wait gives up.
    pub async fn inquire(&mut self, mode: PollMode) -> Result<Option<RemoteAddress>> {
        self.send(Command::Inquire(true)).await?;

        let outcome = poll(
            &mut self.transport,
            &mut self.buffer,
            self.config.discovery,
            mode,
            None,
            |buffer| {
                inquiry_addresses(buffer.as_bytes())
                    .find_map(|raw| {
                        std::str::from_utf8(raw)
                            .ok()
                            .and_then(|text| RemoteAddress::new(text).ok())
                    })
                    .map_or(Step::Pending, Step::Matched)
            },
        )
        .await?;

        let Some(address) = outcome.matched() else {
            return Ok(None);
        };

        let name = self.read_pending_line(MAX_DEVICE_NAME_LEN).await?;
        tracing::debug!("inquiry result {address} ({})", String::from_utf8_lossy(&name));

        self.send(Command::Inquire(false)).await?;
        Ok(Some(address))
    }

    /// Reads the rest of the current line, up to `limit` bytes, without
    /// waiting for bytes that have not arrived yet.
    async fn read_pending_line(&mut self, limit: usize) -> Result<Bytes> {
        let end = Token::End.as_bytes();
        let mut line = BytesMut::new();

        while line.len() < limit + end.len() && self.transport.available()? > 0 {
            line.put_u8(self.transport.read_byte().await?);
            if line.ends_with(end) {
                line.truncate(line.len() - end.len());
                break;
            }
        }
        Ok(line.freeze())
    }

    /// Connects to `address`, resending the request after each `CONNECT:FAIL`.
    ///
    /// Retries share the attempt budget of the wait. The transport is flushed
    /// on every exit.
    pub async fn connect(&mut self, address: &RemoteAddress, mode: PollMode) -> Result<bool> {
        let frame = Command::Connect(address).encode();
        tracing::debug!("sending command: {:?}", String::from_utf8_lossy(&frame));
        self.transport.write(frame.clone()).await?;

        let outcome = poll(
            &mut self.transport,
            &mut self.buffer,
            self.config.connect,
            mode,
            Some(&frame),
            |buffer| {
                if buffer.contains(Token::ConnectOk) {
                    Step::Matched(())
                } else if buffer.contains(Token::ConnectFail) {
                    tracing::debug!("connect to {address} failed, retrying");
                    Step::Retry
                } else {
                    Step::Pending
                }
            },
        )
        .await;

        self.transport.flush().await?;
        let connected = outcome?.is_matched();
        if connected {
            tracing::info!("connected to {address}");
        }
        Ok(connected)
    }

    /// Waits for a remote device to request the pairing PIN.
    pub async fn wait_for_pin_request(&mut self, mode: PollMode) -> Result<bool> {
        let outcome = poll(
            &mut self.transport,
            &mut self.buffer,
            self.config.status,
            mode,
            None,
            |buffer| {
                if buffer.contains(Token::PinRequest) {
                    Step::Matched(())
                } else {
                    Step::Pending
                }
            },
        )
        .await?;
        Ok(outcome.is_matched())
    }

    /// Reads until `terminator` or a link error token.
    ///
    /// There is no attempt budget: this only returns once one of the two
    /// has been received.
    pub async fn receive_until(&mut self, terminator: u8) -> Result<Received> {
        let mut data = BytesMut::new();

        loop {
            if self.transport.available()? == 0 {
                tokio::time::sleep(self.config.receive_interval).await;
                continue;
            }

            let byte = self.transport.read_byte().await?;
            data.put_u8(byte);

            if byte == terminator {
                return Ok(Received {
                    data: data.freeze(),
                    terminated: true,
                });
            }
            if ends_with_link_error(&data) {
                tracing::warn!("link error: {:?}", String::from_utf8_lossy(&data));
                return Ok(Received {
                    data: data.freeze(),
                    terminated: false,
                });
            }
        }
    }

    /// Reads one byte if one is pending.
    pub async fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.transport.available()? == 0 {
            return Ok(None);
        }
        self.transport.read_byte().await.map(Some)
    }

    /// Reads every pending byte into the accumulation buffer.
    ///
    /// Returns the number of bytes read.
    pub async fn drain(&mut self) -> Result<usize> {
        self.reset_buffer();
        let mut count = 0;
        while self.transport.available()? > 0 {
            let byte = self.transport.read_byte().await?;
            self.buffer.push(byte);
            count += 1;
        }

        if count > 0 {
            tracing::debug!(
                "drained {count} bytes: {:?}",
                String::from_utf8_lossy(self.buffer.as_bytes())
            );
        }
        Ok(count)
    }
}
