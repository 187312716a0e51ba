//! Fixed-capacity accumulation buffer for incoming response bytes.
//!
//! The module's replies have no length prefix, so bytes are appended one at
//! a time and the contents are scanned for tokens after every byte:
//! ```text
//! ┌───────────────────────────────┬───┬─────────────┐
//! │  received bytes (len = cursor)│ 0 │   unused    │
//! └───────────────────────────────┴───┴─────────────┘
//!                                   ^ cursor, always <= CAPACITY - 1
//! ```

use crate::protocol::command::Token;

/// Buffer capacity, including the terminator slot.
pub const FRAME_BUFFER_CAPACITY: usize = 128;

/// Bounded, always-terminated byte buffer.
///
/// When an append would leave no room for the terminator the buffer is
/// reset first, so any partially received token is lost.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    storage: [u8; FRAME_BUFFER_CAPACITY],
    cursor: usize,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: [0; FRAME_BUFFER_CAPACITY],
            cursor: 0,
        }
    }

    /// Empties the buffer.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.storage[0] = 0;
    }

    /// Appends a byte, resetting first if the buffer is full.
    pub fn push(&mut self, byte: u8) {
        if self.cursor >= FRAME_BUFFER_CAPACITY - 1 {
            tracing::warn!(
                "frame buffer full, discarding {} bytes: {:?}",
                self.cursor,
                String::from_utf8_lossy(self.as_bytes())
            );
            self.reset();
        }

        self.storage[self.cursor] = byte;
        self.cursor += 1;
        self.storage[self.cursor] = 0;
    }

    /// Returns the current contents, excluding the terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }

    /// Returns the number of buffered bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cursor
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Returns the position of the first occurrence of `needle`.
    #[must_use]
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        find_from(self.as_bytes(), needle, 0)
    }

    /// Returns the position of the first occurrence of `token`.
    #[must_use]
    pub fn find_token(&self, token: Token) -> Option<usize> {
        self.find(token.as_bytes())
    }

    /// Returns true if `token` occurs anywhere in the buffer.
    #[must_use]
    pub fn contains(&self, token: Token) -> bool {
        self.find_token(token).is_some()
    }

    /// Returns the bytes following the first occurrence of `token`.
    #[must_use]
    pub fn after(&self, token: Token) -> Option<&[u8]> {
        self.find_token(token)
            .map(|pos| &self.as_bytes()[pos + token.as_bytes().len()..])
    }
}

/// Substring search starting at `start`, returning an absolute position.
#[must_use]
pub fn find_from(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
    if needle.is_empty() {
        return (start <= haystack.len()).then_some(start);
    }
    haystack
        .get(start..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + start)
}
