//! Error types for the btshield library.

use thiserror::Error;

/// The main error type for btshield operations.
///
/// Protocol outcomes (no match, negative acknowledgement, link loss) are
/// reported as booleans by the driver. This type only carries transport
/// faults and arguments rejected before anything reaches the wire.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has not been opened.
    #[error("not connected")]
    NotConnected,

    /// Invalid remote address.
    #[error("invalid remote address: {reason}")]
    InvalidAddress { reason: String },

    /// Invalid friendly name.
    #[error("invalid device name: {reason}")]
    InvalidName { reason: String },

    /// PIN outside the four-digit range.
    #[error("invalid PIN {0}: must be between 0 and 9999")]
    InvalidPin(u16),
}

/// Result type alias for btshield operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::NotConnected.to_string(), "not connected");
        assert_eq!(
            Error::InvalidPin(12345).to_string(),
            "invalid PIN 12345: must be between 0 and 9999"
        );
        let err = Error::InvalidAddress {
            reason: "empty".into(),
        };
        assert_eq!(err.to_string(), "invalid remote address: empty");
    }
}
