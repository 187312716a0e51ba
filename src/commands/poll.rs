//! Shared polling loop behind every response wait.
//!
//! Each wait reads the transport one byte at a time into the
//! [`FrameBuffer`] and asks a predicate what the contents mean. When the
//! transport is empty the loop sleeps for the policy interval; in
//! non-blocking mode each empty observation also counts toward the
//! attempt budget.

use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;
use crate::protocol::FrameBuffer;
use crate::transport::Transport;

/// Interval and attempt budget for a polling wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep between polls of an empty transport.
    pub interval: Duration,
    /// Empty polls tolerated in non-blocking mode.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on the time a non-blocking wait spends sleeping.
    ///
    /// Saturates at [`Duration::MAX`].
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

/// Whether a wait may give up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PollMode {
    /// Wait until the response arrives, however long it takes.
    #[default]
    Blocking,
    /// Give up once the attempt budget is spent.
    NonBlocking,
}

impl From<bool> for PollMode {
    fn from(block: bool) -> Self {
        if block { Self::Blocking } else { Self::NonBlocking }
    }
}

/// Predicate verdict after each received byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<V> {
    /// Keep reading.
    Pending,
    /// The expected response arrived.
    Matched(V),
    /// A definitive negative response arrived; stop without retrying.
    Rejected,
    /// Discard the buffer, resend the retry frame if any, and keep reading.
    Retry,
}

/// Final result of a polling wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<V> {
    /// The predicate matched.
    Matched(V),
    /// The predicate rejected the response.
    Rejected,
    /// The attempt budget ran out.
    Exhausted,
}

impl<V> PollOutcome<V> {
    /// Returns the matched value, if any.
    #[must_use]
    pub fn matched(self) -> Option<V> {
        match self {
            Self::Matched(value) => Some(value),
            Self::Rejected | Self::Exhausted => None,
        }
    }

    /// Returns true if the predicate matched.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Polls `transport` until `predicate` settles the wait.
///
/// The buffer is reset before the first read. A blocking wait that never
/// sees a matching response never returns; bound it externally with
/// `tokio::time::timeout` if needed.
pub async fn poll<T, V, F>(
    transport: &mut T,
    buffer: &mut FrameBuffer,
    policy: RetryPolicy,
    mode: PollMode,
    retry_frame: Option<&Bytes>,
    mut predicate: F,
) -> Result<PollOutcome<V>>
where
    T: Transport + ?Sized,
    F: FnMut(&FrameBuffer) -> Step<V>,
{
    buffer.reset();
    let mut attempts = 0u32;

    loop {
        if transport.available()? > 0 {
            let byte = transport.read_byte().await?;
            buffer.push(byte);

            match predicate(buffer) {
                Step::Pending => {}
                Step::Matched(value) => return Ok(PollOutcome::Matched(value)),
                Step::Rejected => return Ok(PollOutcome::Rejected),
                Step::Retry => {
                    if let Some(frame) = retry_frame {
                        tracing::debug!("resending {:?}", String::from_utf8_lossy(frame));
                        transport.write(frame.clone()).await?;
                    }
                    buffer.reset();
                }
            }
        } else {
            if mode == PollMode::NonBlocking {
                attempts += 1;
                if attempts >= policy.max_attempts {
                    tracing::debug!("no response after {attempts} attempts");
                    return Ok(PollOutcome::Exhausted);
                }
            }
            tokio::time::sleep(policy.interval).await;
        }
    }
}
