use lawicel_frame::CanMessage;
use tokio::sync::broadcast;

use crate::error::Result;

/// Operations every CAN controller offers, independent of adapter dialect.
pub trait CanController {
    /// Start bus traffic at `bitrate_kbps` (kbit/s).
    ///
    /// Lawicel adapters default to
    /// [`DEFAULT_BITRATE_KBPS`](lawicel_frame::DEFAULT_BITRATE_KBPS).
    fn open_channel(&self, bitrate_kbps: u32) -> Result<()>;

    /// Stop bus traffic.
    fn close_channel(&self) -> Result<()>;

    /// Queue a frame for transmission. No delivery confirmation.
    fn send_message(&self, message: &CanMessage) -> Result<()>;

    /// Receive every CAN frame read from the bus from now on.
    fn subscribe(&self) -> broadcast::Receiver<CanMessage>;
}
