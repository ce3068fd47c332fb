//! Controller for Lawicel serial CAN adapters.
//!
//! This is the layer applications talk to. Open the link, open the CAN
//! channel, send frames, and receive frames and adapter replies:
//!
//! ```no_run
//! use lawicel_controller::{CanController, LawicelController};
//! use lawicel_frame::CanMessage;
//!
//! # async fn run() -> lawicel_controller::Result<()> {
//! let controller = LawicelController::new();
//! controller.connect("/dev/ttyUSB0")?;
//! controller.open_channel(500)?;
//!
//! let mut frames = controller.subscribe();
//! controller.send_message(&CanMessage::new(0x123, vec![0xAB, 0xCD]))?;
//! let version = controller.get_version().await?;
//!
//! while let Ok(frame) = frames.recv().await {
//!     println!("{:03x} {:02X?}", frame.address, frame.data.as_ref());
//! }
//! controller.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connector;
pub mod controller;
pub mod correlator;
pub mod error;
pub mod info;
mod listener;
pub mod traits;

pub use config::ControllerConfig;
pub use connector::{Connector, SerialConnector};
pub use controller::{ConnectionState, LawicelController};
pub use correlator::ResponseCorrelator;
pub use error::{ControllerError, Result};
pub use info::{split_version, AdapterInfo};
pub use traits::CanController;
