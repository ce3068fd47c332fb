//! Byte-stream transport abstraction for Lawicel CAN adapters.
//!
//! Provides a unified interface over the links an adapter can sit behind:
//! - Serial ports (USB CDC, FTDI, native UARTs) via the `serialport` crate
//! - An in-process memory pair that emulates an adapter for tests and demos
//!
//! This is the lowest layer of the driver. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod config;
pub mod error;
pub mod memory;
pub mod serial;
pub mod traits;

pub use config::{DataBits, Parity, SerialConfig, StopBits, DEFAULT_BAUD_RATE};
pub use error::{Result, TransportError};
pub use memory::{MemoryDevice, MemoryTransport};
pub use serial::SerialTransport;
pub use traits::{is_timeout, Transport};
