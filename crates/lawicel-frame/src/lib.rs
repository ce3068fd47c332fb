//! The Lawicel ASCII dialect spoken by serial CAN adapters.
//!
//! Every exchange with the adapter is a carriage-return terminated ASCII
//! record:
//! - Outbound commands (`O`, `C`, `S5`, `t1232ABCD`, ...) are written by
//!   [`CommandWriter`]
//! - Inbound records are delimited and classified by [`RecordParser`]: a
//!   21-byte record tagged `t` is a received CAN frame, anything else is a
//!   reply whose first byte identifies the command it answers
//!
//! Callers never see partial records; the parser carries incomplete bytes
//! across reads.

pub mod bitrate;
pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod writer;

pub use bitrate::{bitrate_code, supported_bitrates, DEFAULT_BITRATE_CODE, DEFAULT_BITRATE_KBPS};
pub use codec::{
    encode_transmit, CanMessage, FrameConfig, DEFAULT_MAX_RECORD_LEN, DEFAULT_READ_CHUNK_SIZE,
    FRAME_BODY_LEN, FRAME_RECORD_LEN, MAX_DATA_LEN,
};
pub use command::{Command, CARRIAGE_RETURN, FRAME_TAG, SERIAL_NUMBER_TAG, VERSION_TAG};
pub use error::{FrameError, Result};
pub use reader::{Record, RecordParser, RecordReader};
pub use writer::CommandWriter;
