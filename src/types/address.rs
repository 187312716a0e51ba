//! Remote device address type.

use std::fmt;

use crate::error::{Error, Result};

/// Capacity of the address slot, including the terminator the module expects.
pub const ADDRESS_CAPACITY: usize = 64;

/// Maximum number of characters an address may hold.
pub const MAX_ADDRESS_LEN: usize = ADDRESS_CAPACITY - 1;

/// Textual identifier of a remote Bluetooth device.
///
/// The module reports and accepts addresses as comma separated hex octets,
/// e.g. `aa,bb,cc,dd,ee,ff`. The address is kept as text because the
/// firmware echoes it back verbatim in `+CONN` and `+RTINQ`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteAddress(String);

impl RemoteAddress {
    /// Creates an address from text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty, longer than
    /// [`MAX_ADDRESS_LEN`] bytes, or contains line breaks.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(Error::InvalidAddress {
                reason: "address is empty".into(),
            });
        }
        if address.len() > MAX_ADDRESS_LEN {
            return Err(Error::InvalidAddress {
                reason: format!(
                    "{} bytes exceeds maximum {MAX_ADDRESS_LEN}",
                    address.len()
                ),
            });
        }
        if address.contains(['\r', '\n']) {
            return Err(Error::InvalidAddress {
                reason: "address contains a line break".into(),
            });
        }
        Ok(Self(address))
    }

    /// Builds the `aa,bb,cc,dd,ee,ff` form from six octets.
    #[must_use]
    pub fn from_octets(octets: [u8; 6]) -> Self {
        let text = octets
            .iter()
            .map(|octet| hex::encode([*octet]))
            .collect::<Vec<_>>()
            .join(",");
        Self(text)
    }

    /// Parses the address as six hex octets.
    ///
    /// Accepts `,` or `:` as separator. Returns `None` for addresses that
    /// are not in octet form (the module accepts other forms verbatim).
    #[must_use]
    pub fn octets(&self) -> Option<[u8; 6]> {
        let mut octets = [0u8; 6];
        let mut parts = self.0.split([',', ':']);
        for slot in &mut octets {
            let part = parts.next()?;
            if part.len() != 2 {
                return None;
            }
            let mut byte = [0u8; 1];
            hex::decode_to_slice(part, &mut byte).ok()?;
            *slot = byte[0];
        }
        if parts.next().is_some() {
            return None;
        }
        Some(octets)
    }

    /// Returns the address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for RemoteAddress {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl AsRef<str> for RemoteAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_octets() {
        let addr = RemoteAddress::from_octets([0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x0f]);
        assert_eq!(addr.as_str(), "aa,bb,cc,01,02,0f");
        assert_eq!(addr.octets(), Some([0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x0f]));
    }

    #[test]
    fn test_address_octets_colon_separated() {
        let addr = RemoteAddress::new("00:1A:2b:3C:4d:5E").unwrap();
        assert_eq!(addr.octets(), Some([0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e]));
    }

    #[test]
    fn test_address_non_octet_form() {
        let addr = RemoteAddress::new("my-peer").unwrap();
        assert_eq!(addr.octets(), None);

        let addr = RemoteAddress::new("aa,bb,cc,dd,ee,ff,00").unwrap();
        assert_eq!(addr.octets(), None);
    }

    #[test]
    fn test_address_rejects_invalid() {
        assert!(RemoteAddress::new("").is_err());
        assert!(RemoteAddress::new("aa,bb\r\n").is_err());
        assert!(RemoteAddress::new("a".repeat(MAX_ADDRESS_LEN)).is_ok());
        assert!(RemoteAddress::new("a".repeat(MAX_ADDRESS_LEN + 1)).is_err());
    }
}
