//! Command templates and response tokens for the module's AT dialect.
//!
//! Every command is framed as `\r\n+<NAME>[=<value>]\r\n`. Responses carry
//! no framing of their own and are recognized by substring tokens.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::types::{BaudRate, Pin, RemoteAddress, Role};

/// Commands sent to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `+STWMOD` - set master or slave role.
    SetRole(Role),
    /// `+STBD` - set the module UART baud rate.
    SetBaudRate(BaudRate),
    /// `+STNA` - set the friendly name.
    SetName(&'a str),
    /// `+STPIN` - set the pairing PIN.
    SetPin(Pin),
    /// `+DLPIN` - clear the pairing PIN.
    ClearPin,
    /// `+STAUTO` - auto-connect to the last paired device on power up.
    AutoConnect(bool),
    /// `+STOAUT` - permit paired devices to connect.
    PairedConnect(bool),
    /// `+LOSSRECONN` - reconnect automatically after link loss.
    Reconnect(bool),
    /// `+INQ` - start or stop an inquiry.
    Inquire(bool),
    /// `+CONN` - connect to a remote address.
    Connect(&'a RemoteAddress),
    /// `+RTADDR` - read the local address.
    ReadLocalAddress,
    /// `+RTPIN` - answer a remote PIN request.
    AnswerPin(Pin),
    /// `+STECHO` - enable or disable command echo.
    Echo(bool),
}

impl Command<'_> {
    /// Renders the command to its wire form.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        match self {
            Self::SetRole(Role::Master) => Bytes::from_static(b"\r\n+STWMOD=1\r\n"),
            Self::SetRole(Role::Slave) => Bytes::from_static(b"\r\n+STWMOD=0\r\n"),
            Self::SetBaudRate(rate) => Bytes::from(format!("\r\n+STBD={rate}\r\n")),
            Self::SetName(name) => Bytes::from(format!("\r\n+STNA={name}\r\n")),
            Self::SetPin(pin) => Bytes::from(format!("\r\n+STPIN={pin}\r\n")),
            Self::ClearPin => Bytes::from_static(b"\r\n+DLPIN\r\n"),
            Self::AutoConnect(on) => switch("STAUTO", *on),
            Self::PairedConnect(on) => switch("STOAUT", *on),
            Self::Reconnect(on) => switch("LOSSRECONN", *on),
            Self::Inquire(true) => Bytes::from_static(b"\r\n+INQ=1\r\n"),
            Self::Inquire(false) => Bytes::from_static(b"\r\n+INQ=0\r\n"),
            Self::Connect(address) => Bytes::from(format!("\r\n+CONN={address}\r\n")),
            Self::ReadLocalAddress => Bytes::from_static(b"\r\n+RTADDR\r\n"),
            Self::AnswerPin(pin) => Bytes::from(format!("\r\n+RTPIN={pin}\r\n")),
            Self::Echo(on) => switch("STECHO", *on),
        }
    }
}

fn switch(name: &str, on: bool) -> Bytes {
    Bytes::from(format!("\r\n+{name}={}\r\n", u8::from(on)))
}

/// Checks that a friendly name can be embedded in `+STNA` without breaking
/// the command framing.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName {
            reason: "name is empty".into(),
        });
    }
    if name.contains(['\r', '\n']) {
        return Err(Error::InvalidName {
            reason: "name contains a line break".into(),
        });
    }
    Ok(())
}

/// Response tokens recognized in the incoming stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Inquiry result prefix, followed by `address;name\r\n`.
    InquiryResponse,
    /// Connection established.
    ConnectOk,
    /// Connection attempt failed.
    ConnectFail,
    /// Status report prefix, followed by a numeric state code.
    ModuleState,
    /// A remote device asks for the pairing PIN.
    PinRequest,
    /// End of a response line.
    End,
    /// Generic firmware error.
    Error,
    /// The remote link dropped.
    LinkLoss,
}

impl Token {
    /// Returns the literal bytes of the token.
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::InquiryResponse => b"\r\n+RTINQ=",
            Self::ConnectOk => b"CONNECT:OK",
            Self::ConnectFail => b"CONNECT:FAIL",
            Self::ModuleState => b"+BTSTATE:",
            Self::PinRequest => b"\r\n+INPIN\r\n",
            Self::End => b"\r\n",
            Self::Error => b"ERROR",
            Self::LinkLoss => b"LINK LOSS",
        }
    }
}

/// Tokens that abort a raw receive.
pub const LINK_ERROR_TOKENS: [Token; 2] = [Token::Error, Token::LinkLoss];
