//! Driver for Lawicel ASCII serial CAN adapters.
//!
//! lawicel talks to CAN adapters that speak the Lawicel (slcan) dialect over
//! a serial port: open and close the CAN channel, transmit frames, and
//! receive frames and adapter replies in the background.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial link abstraction, real ports and an in-memory adapter
//! - [`frame`]: Command encoding, bit rate codes and inbound record parsing
//! - [`controller`]: Connection lifecycle, read loop and reply correlation

/// Re-export transport types.
pub mod transport {
    pub use lawicel_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use lawicel_frame::*;
}

/// Re-export controller types.
pub mod controller {
    pub use lawicel_controller::*;
}

pub use lawicel_controller::{CanController, ControllerConfig, ControllerError, LawicelController};
pub use lawicel_frame::CanMessage;
