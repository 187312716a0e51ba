//! Parsing of module responses out of the accumulation buffer.
//!
//! Parsers work on the raw buffer contents and return `None` until the
//! response they look for is complete.

use crate::protocol::buffer::find_from;
use crate::protocol::command::Token;

/// Longest friendly name a remote device can report.
pub const MAX_DEVICE_NAME_LEN: usize = 248;

/// Iterates over the address fields of the `+RTINQ` results in `data`.
///
/// Format:
/// ```text
/// \r\n+RTINQ=<address>;<name>\r\n
/// ```
///
/// An address is yielded as soon as its `;` delimiter has been received, so
/// the name never has to fit in the buffer. A line that ends before its
/// delimiter is skipped. Iteration stops at a result still being received.
pub fn inquiry_addresses(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let token = Token::InquiryResponse.as_bytes();
    let end = Token::End.as_bytes();
    let mut cursor = 0;

    std::iter::from_fn(move || {
        loop {
            let start = find_from(data, token, cursor)? + token.len();
            let line_end = find_from(data, end, start);
            match (find_from(data, b";", start), line_end) {
                (Some(delimiter), Some(line_end)) if line_end < delimiter => cursor = line_end,
                (Some(delimiter), _) => {
                    cursor = delimiter + 1;
                    return Some(&data[start..delimiter]);
                }
                (None, Some(line_end)) => cursor = line_end,
                (None, None) => return None,
            }
        }
    })
}

/// Parses the state code of a `+BTSTATE:` report.
///
/// Returns `None` until at least one digit and the byte terminating the
/// number have been received, so a partially received code is never read.
#[must_use]
pub fn parse_status(data: &[u8]) -> Option<u32> {
    let token = Token::ModuleState.as_bytes();
    let start = find_from(data, token, 0)? + token.len();
    let rest = &data[start..];

    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits == rest.len() {
        return None;
    }

    // Oversized codes saturate and match no known status.
    Some(rest[..digits].iter().fold(0u32, |acc, &b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    }))
}

/// Returns true if `data` ends with a link-level error token.
///
/// Called after every appended byte, so a token is seen exactly when it
/// completes.
#[must_use]
pub fn ends_with_link_error(data: &[u8]) -> bool {
    crate::protocol::command::LINK_ERROR_TOKENS
        .iter()
        .any(|token| data.ends_with(token.as_bytes()))
}
