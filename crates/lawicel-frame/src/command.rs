//! Outbound commands and record tags.
//!
//! Every command is ASCII text terminated by a single carriage return.
//! Replies to queries come back tagged with the query's first byte.

use std::fmt;

use crate::codec::{encode_transmit, CanMessage};

/// Record delimiter and command terminator.
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Tag of a received CAN frame record (and of the transmit command).
pub const FRAME_TAG: u8 = b't';

/// Tag of the firmware version reply.
pub const VERSION_TAG: u8 = b'V';

/// Tag of the serial number reply.
pub const SERIAL_NUMBER_TAG: u8 = b'N';

/// A command understood by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Empty line used to flush partial input out of the adapter.
    Flush,
    /// Turn auto-poll on so received frames are forwarded unprompted.
    AutoPoll,
    /// Select a bus speed by its adapter code (0-8).
    SetBitRate(u8),
    /// Open the CAN channel.
    Open,
    /// Close the CAN channel.
    Close,
    /// Transmit a CAN frame.
    Transmit(&'a CanMessage),
    /// Request the firmware version.
    Version,
    /// Request the serial number.
    SerialNumber,
}

impl Command<'_> {
    /// Returns a human-readable name for the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Flush => "flush",
            Command::AutoPoll => "auto-poll",
            Command::SetBitRate(_) => "set-bitrate",
            Command::Open => "open",
            Command::Close => "close",
            Command::Transmit(_) => "transmit",
            Command::Version => "version",
            Command::SerialNumber => "serial-number",
        }
    }

    /// Tag of the reply this command solicits, if any.
    pub fn reply_tag(&self) -> Option<u8> {
        match self {
            Command::Version => Some(VERSION_TAG),
            Command::SerialNumber => Some(SERIAL_NUMBER_TAG),
            _ => None,
        }
    }
}

impl fmt::Display for Command<'_> {
    /// The command text without its terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The flush line is itself a bare CR, so one flush puts two on the wire.
            Command::Flush => f.write_str("\r"),
            Command::AutoPoll => f.write_str("X1"),
            Command::SetBitRate(code) => write!(f, "S{code}"),
            Command::Open => f.write_str("O"),
            Command::Close => f.write_str("C"),
            Command::Transmit(message) => f.write_str(&encode_transmit(message)),
            Command::Version => f.write_str("V"),
            Command::SerialNumber => f.write_str("N"),
        }
    }
}
