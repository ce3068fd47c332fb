use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::Result;

/// A connected byte stream to an adapter.
///
/// Reads are bounded by a read timeout: a read that sees no data within the
/// timeout fails with `TimedOut` (or `WouldBlock`). That timeout is the
/// cancellation mechanism for a blocked reader; callers check their own
/// cancellation signal whenever a read returns.
pub trait Transport: Read + Write + Send {
    /// Drop any bytes received but not yet read.
    fn discard_input(&mut self) -> Result<()>;

    /// Set the timeout applied to each read.
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Open a second handle onto the same stream.
    ///
    /// The read loop reads through its own handle.
    fn try_clone_transport(&self) -> Result<Box<dyn Transport>>;

    /// Transport name for diagnostics.
    fn name(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }

    fn try_clone_transport(&self) -> Result<Box<dyn Transport>> {
        (**self).try_clone_transport()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Returns true if the error only means "no data within the read timeout".
pub fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}
