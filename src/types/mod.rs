//! Data types used by the driver.
//!
//! - Remote device addresses
//! - Module role, baud rate, status and PIN values

pub mod address;
pub mod device;

pub use address::{ADDRESS_CAPACITY, MAX_ADDRESS_LEN, RemoteAddress};
pub use device::{BaudRate, ModuleStatus, Pin, Role};
