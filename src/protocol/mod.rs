//! Protocol definitions for the module's AT dialect.
//!
//! This module contains the low-level protocol types including:
//! - Command templates and response tokens
//! - The fixed-capacity accumulation buffer
//! - Response parsing

pub mod buffer;
pub mod command;
pub mod parser;

pub use buffer::{FRAME_BUFFER_CAPACITY, FrameBuffer};
pub use command::{Command, LINK_ERROR_TOKENS, Token, validate_name};
pub use parser::{MAX_DEVICE_NAME_LEN, ends_with_link_error, inquiry_addresses, parse_status};
