use std::io::{self, ErrorKind, Write};

use tracing::debug;

use crate::command::{Command, CARRIAGE_RETURN};
use crate::error::{FrameError, Result};

/// Longest command line is a full transmit: `t` + 3 + 1 + 16 + CR.
const LINE_CAPACITY: usize = 32;

/// Writes CR-terminated commands to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    line: Vec<u8>,
}

impl<T: Write> CommandWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            line: Vec::with_capacity(LINE_CAPACITY),
        }
    }

    /// Write a command line and flush it to the adapter (blocking).
    pub fn send(&mut self, command: &Command<'_>) -> Result<()> {
        debug!(command = command.name(), "sending command");
        self.send_text(&command.to_string())
    }

    /// Write `text` plus the terminator, for commands without a [`Command`]
    /// variant.
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        self.line.clear();
        self.line.extend_from_slice(text.as_bytes());
        self.line.push(CARRIAGE_RETURN);

        write_line(&mut self.inner, &self.line)?;
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Err(err) if is_transient(&err) => continue,
                other => return other.map_err(FrameError::from),
            }
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn write_line<W: Write>(out: &mut W, mut line: &[u8]) -> Result<()> {
    while !line.is_empty() {
        match out.write(line) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => line = &line[n..],
            Err(err) if is_transient(&err) => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn is_transient(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock)
}
