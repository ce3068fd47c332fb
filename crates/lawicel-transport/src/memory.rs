//! In-process transport pair emulating an adapter.
//!
//! [`MemoryTransport`] is the host side and behaves like a serial port with a
//! read timeout. [`MemoryDevice`] is the adapter side: it feeds bytes to the
//! host, observes what the host wrote, and can inject read failures.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::DEFAULT_READ_TIMEOUT;
use crate::error::Result;
use crate::traits::Transport;

#[derive(Default)]
struct LinkState {
    /// Device -> host bytes not yet read.
    inbound: VecDeque<u8>,
    /// Host -> device bytes, in write order.
    outbound: Vec<u8>,
    read_errors: VecDeque<ErrorKind>,
    max_read: Option<usize>,
    unplugged: bool,
    discards: usize,
}

#[derive(Default)]
struct Link {
    state: Mutex<LinkState>,
    readable: Condvar,
    written: Condvar,
}

impl Link {
    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Host side of an in-memory adapter link.
pub struct MemoryTransport {
    link: Arc<Link>,
    read_timeout: Duration,
    name: String,
}

/// Adapter side of an in-memory link.
#[derive(Clone)]
pub struct MemoryDevice {
    link: Arc<Link>,
}

impl MemoryTransport {
    /// Create a connected host/device pair.
    pub fn pair() -> (MemoryTransport, MemoryDevice) {
        Self::pair_named("memory")
    }

    /// Create a connected pair whose host side reports `name`.
    pub fn pair_named(name: impl Into<String>) -> (MemoryTransport, MemoryDevice) {
        let link = Arc::new(Link::default());
        let transport = MemoryTransport {
            link: Arc::clone(&link),
            read_timeout: DEFAULT_READ_TIMEOUT,
            name: name.into(),
        };
        (transport, MemoryDevice { link })
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let deadline = Instant::now() + self.read_timeout;
        let mut state = self.link.lock();
        loop {
            if let Some(kind) = state.read_errors.pop_front() {
                return Err(std::io::Error::new(kind, "injected read error"));
            }

            if !state.inbound.is_empty() {
                let limit = state.max_read.map_or(buf.len(), |max| max.min(buf.len()));
                let n = limit.min(state.inbound.len());
                for (slot, byte) in buf[..n].iter_mut().zip(state.inbound.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }

            state = self
                .link
                .readable
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut state = self.link.lock();
        if state.unplugged {
            return Err(std::io::Error::from(ErrorKind::BrokenPipe));
        }
        state.outbound.extend_from_slice(buf);
        self.link.written.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn discard_input(&mut self) -> Result<()> {
        let mut state = self.link.lock();
        let dropped = state.inbound.len();
        state.inbound.clear();
        state.discards += 1;
        debug!(transport = %self.name, dropped, "discarded pending input");
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }

    fn try_clone_transport(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(MemoryTransport {
            link: Arc::clone(&self.link),
            read_timeout: self.read_timeout,
            name: self.name.clone(),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("name", &self.name)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

impl MemoryDevice {
    /// Queue bytes for the host to read.
    pub fn push(&self, bytes: impl AsRef<[u8]>) {
        let mut state = self.link.lock();
        state.inbound.extend(bytes.as_ref());
        self.link.readable.notify_all();
    }

    /// Make the host's next read fail with `kind`.
    pub fn fail_next_read(&self, kind: ErrorKind) {
        let mut state = self.link.lock();
        state.read_errors.push_back(kind);
        self.link.readable.notify_all();
    }

    /// Cap the number of bytes a single host read may return.
    pub fn set_max_read(&self, max: Option<usize>) {
        self.link.lock().max_read = max.map(|max| max.max(1));
    }

    /// Make every subsequent host write fail, as if the cable was pulled.
    pub fn unplug(&self) {
        self.link.lock().unplugged = true;
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.link.lock().outbound.clone()
    }

    /// Everything the host has written so far, clearing the record.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.link.lock().outbound)
    }

    /// Block until the host has written `needle`, or `timeout` elapses.
    pub fn wait_for_written(&self, needle: &[u8], timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.link.lock();
        loop {
            if contains(&state.outbound, needle) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .link
                .written
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Bytes queued for the host but not yet read.
    pub fn pending_input(&self) -> usize {
        self.link.lock().inbound.len()
    }

    /// How many times the host discarded its input.
    pub fn discard_count(&self) -> usize {
        self.link.lock().discards
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
