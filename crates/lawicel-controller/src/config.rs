use std::time::Duration;

use lawicel_frame::{FrameConfig, DEFAULT_MAX_RECORD_LEN, DEFAULT_READ_CHUNK_SIZE};
use lawicel_transport::SerialConfig;
use serde::{Deserialize, Serialize};

/// How long a query waits for its reply by default.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause taken on either side of draining input at disconnect.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Buffered events per notification channel before slow subscribers lag.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Controller behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Serial link settings. The port name is replaced by the one passed to
    /// [`connect`](crate::LawicelController::connect).
    pub serial: SerialConfig,
    /// Reply deadline for version and serial number queries.
    pub response_timeout: Duration,
    /// Delay before and after discarding input during disconnect.
    pub settle_delay: Duration,
    /// Bytes requested per read in the read loop.
    pub read_chunk_size: usize,
    /// Longest inbound record kept before it is discarded.
    pub max_record_len: usize,
    /// Capacity of the frame and reply notification channels.
    pub event_capacity: usize,
}

impl ControllerConfig {
    pub(crate) fn serial_for(&self, port_name: &str) -> SerialConfig {
        SerialConfig {
            port_name: port_name.to_owned(),
            ..self.serial.clone()
        }
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            read_chunk_size: self.read_chunk_size,
            max_record_len: self.max_record_len,
            read_timeout: Some(self.serial.read_timeout),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_record_len: DEFAULT_MAX_RECORD_LEN,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
