use bytes::Bytes;

use crate::command::FRAME_TAG;
use crate::error::{FrameError, Result};

/// A received CAN frame record: tag (1) + body (20) = 21 bytes.
pub const FRAME_RECORD_LEN: usize = 21;

/// Frame record body length once the tag is stripped.
pub const FRAME_BODY_LEN: usize = FRAME_RECORD_LEN - 1;

/// Classic CAN payload limit.
pub const MAX_DATA_LEN: usize = 8;

/// Default size of a single transport read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Default bound on an undelimited record.
pub const DEFAULT_MAX_RECORD_LEN: usize = 4096;

const ADDRESS_DIGITS: usize = 3;
const TIMESTAMP_DIGITS: usize = 4;

/// A CAN message as carried over the adapter link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanMessage {
    /// Arbitration ID.
    pub address: u32,
    /// Data length code.
    pub data_length: u8,
    /// Payload bytes.
    pub data: Bytes,
    /// Adapter timestamp in milliseconds, when the adapter appends one.
    pub timestamp: Option<u16>,
}

impl CanMessage {
    /// Create a message whose length code matches the payload.
    pub fn new(address: u32, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            address,
            data_length: u8::try_from(data.len()).unwrap_or(u8::MAX),
            data,
            timestamp: None,
        }
    }

    /// Decode a frame record body (the record without its `t` tag).
    ///
    /// Layout:
    /// ```text
    /// ┌──────────────┬──────────┬─────────────────────┬─────────────────┐
    /// │ Address      │ Length   │ Data                │ Timestamp       │
    /// │ 3 hex digits │ 1 hex    │ Length × 2 hex      │ 4 hex, optional │
    /// └──────────────┴──────────┴─────────────────────┴─────────────────┘
    /// ```
    pub fn decode(body: &[u8]) -> Result<Self> {
        let header_len = ADDRESS_DIGITS + 1;
        if body.len() < header_len {
            return Err(FrameError::InvalidBody {
                len: body.len(),
                reason: "missing address or length",
            });
        }

        let address = parse_hex(&body[..ADDRESS_DIGITS], "address")?;
        let data_length = parse_hex(&body[ADDRESS_DIGITS..header_len], "length")? as u8;
        if usize::from(data_length) > MAX_DATA_LEN {
            return Err(FrameError::InvalidBody {
                len: body.len(),
                reason: "data length exceeds 8",
            });
        }

        let data_end = header_len + usize::from(data_length) * 2;
        if body.len() < data_end {
            return Err(FrameError::InvalidBody {
                len: body.len(),
                reason: "truncated data",
            });
        }

        let data = body[header_len..data_end]
            .chunks_exact(2)
            .map(|pair| parse_hex(pair, "data").map(|byte| byte as u8))
            .collect::<Result<Vec<u8>>>()?;

        let timestamp = match &body[data_end..] {
            [] => None,
            rest if rest.len() == TIMESTAMP_DIGITS => Some(parse_hex(rest, "timestamp")? as u16),
            _ => {
                return Err(FrameError::InvalidBody {
                    len: body.len(),
                    reason: "unexpected trailing bytes",
                })
            }
        };

        Ok(Self {
            address,
            data_length,
            data: Bytes::from(data),
            timestamp,
        })
    }

    /// The transmit command for this message, without terminator.
    pub fn transmit_command(&self) -> String {
        encode_transmit(self)
    }
}

/// Encode a message as a transmit command.
///
/// Wire format: `t<address><length><data>` with address and length as
/// unpadded lowercase hex and each data byte as an uppercase hex pair.
/// Address `0x123`, data `[0xAB, 0xCD]` encodes as `t1232ABCD`.
pub fn encode_transmit(message: &CanMessage) -> String {
    let mut cmd = String::with_capacity(1 + 8 + 2 + message.data.len() * 2);
    cmd.push(FRAME_TAG as char);
    cmd.push_str(&format!("{:x}", message.address));
    cmd.push_str(&format!("{:x}", message.data_length));
    for byte in &message.data {
        cmd.push_str(&format!("{byte:02X}"));
    }
    cmd
}

fn parse_hex(digits: &[u8], field: &'static str) -> Result<u32> {
    let invalid = || FrameError::InvalidHex {
        field,
        value: String::from_utf8_lossy(digits).into_owned(),
    };

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_hexdigit) {
        return Err(invalid());
    }
    let text = std::str::from_utf8(digits).map_err(|_| invalid())?;
    u32::from_str_radix(text, 16).map_err(|_| invalid())
}

/// Configuration for record reading.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Bytes requested per transport read. Default: 4096.
    pub read_chunk_size: usize,
    /// Longest record kept before it is discarded up to the next delimiter.
    pub max_record_len: usize,
    /// Read timeout applied to transports.
    pub read_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_record_len: DEFAULT_MAX_RECORD_LEN,
            read_timeout: None,
        }
    }
}
