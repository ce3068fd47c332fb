use std::time::Duration;

/// Errors that can occur in controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] lawicel_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] lawicel_frame::FrameError),

    /// The operation needs an open link and there is none.
    #[error("not connected")]
    NotConnected,

    /// No reply carrying `tag` arrived in time.
    #[error("timed out after {timeout:?} waiting for '{tag}' reply")]
    Timeout { tag: char, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, ControllerError>;
