//! # btshield
//!
//! A Rust driver for serial-attached Bluetooth SPP modules controlled with
//! `\r\n+CMD=value\r\n` text commands.
//!
//! This library provides async communication with the module over a serial
//! port: configuration, device discovery, connection and raw data transfer.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Byte-at-a-time response matching with bounded buffering
//! - Blocking or budgeted waits for every module response
//! - In-memory transport for testing without hardware
//!
//! ## Quick Start
//!
//! ```no_run
//! use btshield::{BaudRate, BtModule, ModuleStatus, Pin, PollMode, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), btshield::Error> {
//!     let mut module = BtModule::serial("/dev/ttyUSB0");
//!     module
//!         .configure(BaudRate::B38400, Role::Master, "shield", Pin::new(0)?)
//!         .await?;
//!
//!     if module.discover(PollMode::NonBlocking).await? {
//!         println!("Found: {}", module.remote_address().unwrap());
//!         module.connect(None, PollMode::NonBlocking).await?;
//!     }
//!
//!     if module.is_ready(ModuleStatus::Connected, PollMode::NonBlocking).await? {
//!         module.send_raw(b"hello\n").await?;
//!         let reply = module.receive_raw(b'\n').await?;
//!         println!("Received: {:?}", reply.data);
//!     }
//!
//!     module.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Command encoding, response tokens, buffer and parsers
//! - [`types`] - Addresses, roles, baud rates, statuses and PINs
//! - [`transport`] - Transport implementations (serial and in-memory)
//! - [`config`] - Timing configuration
//! - [`commands`] - Command sender and response waits
//! - [`client`] - High-level [`BtModule`] driver

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::BtModule;
pub use commands::{PollMode, Received, RetryPolicy};
pub use config::ModuleConfig;
pub use error::{Error, Result};
pub use protocol::{Command, Token};
pub use transport::{MockTransport, SerialTransport, Transport, serial::list_ports};
pub use types::{BaudRate, ModuleStatus, Pin, RemoteAddress, Role};
