/// Errors that can occur while encoding or decoding Lawicel records.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A field that must be hexadecimal contains other characters.
    #[error("invalid hex in {field}: {value:?}")]
    InvalidHex { field: &'static str, value: String },

    /// A CAN frame record body does not have the expected layout.
    #[error("invalid frame body ({len} bytes): {reason}")]
    InvalidBody { len: usize, reason: &'static str },

    /// An I/O error occurred while reading or writing records.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream accepted no more bytes.
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<lawicel_transport::TransportError> for FrameError {
    fn from(err: lawicel_transport::TransportError) -> Self {
        match err {
            lawicel_transport::TransportError::Io(io) => FrameError::Io(io),
            other => FrameError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
