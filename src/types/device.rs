//! Module configuration values.

use std::fmt;

use crate::error::{Error, Result};

/// Operating role of the module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// Initiates inquiries and connections.
    Master,
    /// Waits to be discovered and connected.
    #[default]
    Slave,
}

impl Role {
    /// Returns true for the master role.
    #[must_use]
    pub const fn is_master(self) -> bool {
        matches!(self, Self::Master)
    }
}

impl From<bool> for Role {
    fn from(is_master: bool) -> Self {
        if is_master { Self::Master } else { Self::Slave }
    }
}

/// UART baud rates supported by the module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BaudRate {
    /// 9600 baud.
    B9600,
    /// 19200 baud.
    B19200,
    /// 38400 baud (factory default).
    #[default]
    B38400,
    /// 57600 baud.
    B57600,
    /// 115200 baud.
    B115200,
    /// 230400 baud.
    B230400,
    /// 460800 baud.
    B460800,
}

impl BaudRate {
    /// All supported rates in ascending order.
    pub const ALL: [Self; 7] = [
        Self::B9600,
        Self::B19200,
        Self::B38400,
        Self::B57600,
        Self::B115200,
        Self::B230400,
        Self::B460800,
    ];

    /// Returns the rate in bits per second.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::B9600 => 9_600,
            Self::B19200 => 19_200,
            Self::B38400 => 38_400,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
            Self::B230400 => 230_400,
            Self::B460800 => 460_800,
        }
    }

    /// Looks up a rate from its numeric value.
    #[must_use]
    pub fn from_u32(rate: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_u32() == rate)
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.as_u32()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// State codes reported in `+BTSTATE:` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModuleStatus {
    /// Firmware is starting up.
    Initializing = 0,
    /// Idle and ready for commands.
    Ready = 1,
    /// Inquiry in progress.
    Inquiring = 2,
    /// Connection in progress.
    Connecting = 3,
    /// Link established.
    Connected = 4,
}

impl ModuleStatus {
    /// Converts a reported state code.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Initializing),
            1 => Some(Self::Ready),
            2 => Some(Self::Inquiring),
            3 => Some(Self::Connecting),
            4 => Some(Self::Connected),
            _ => None,
        }
    }

    /// Returns the numeric state code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Pairing PIN, always transmitted as four zero-padded digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pin(u16);

impl Pin {
    /// Largest PIN representable with four digits.
    pub const MAX: u16 = 9999;

    /// Creates a PIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPin`] if the value has more than four digits.
    pub fn new(value: u16) -> Result<Self> {
        if value > Self::MAX {
            return Err(Error::InvalidPin(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Pin {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}
