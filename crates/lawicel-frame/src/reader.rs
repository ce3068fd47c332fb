use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use lawicel_transport::Transport;
use tracing::{trace, warn};

use crate::codec::{CanMessage, FrameConfig, FRAME_RECORD_LEN};
use crate::command::{CARRIAGE_RETURN, FRAME_TAG};
use crate::error::Result;

/// A complete inbound record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A CAN frame received from the bus.
    Frame(CanMessage),
    /// Any other record, passed on byte-for-byte (possibly empty).
    /// Its first byte, when present, is the tag of the command it answers.
    Reply(Bytes),
}

impl Record {
    /// Leading byte of a reply, or `None` for frames and empty replies.
    pub fn reply_tag(&self) -> Option<u8> {
        match self {
            Record::Reply(payload) => payload.first().copied(),
            Record::Frame(_) => None,
        }
    }
}

/// Splits an inbound byte stream into records.
///
/// Bytes accumulate until a carriage return; the delimiter then classifies
/// and clears the accumulated bytes. Partial records carry over between
/// calls, so records may span any number of reads.
#[derive(Debug)]
pub struct RecordParser {
    buf: BytesMut,
    max_record_len: usize,
    overflowed: bool,
}

impl RecordParser {
    /// Create a parser with the default record bound.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a parser with an explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(FRAME_RECORD_LEN.max(64)),
            max_record_len: config.max_record_len.max(FRAME_RECORD_LEN),
            overflowed: false,
        }
    }

    /// Consume a chunk, appending every record it completes to `out`.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<Record>) {
        for &byte in chunk {
            if byte == CARRIAGE_RETURN {
                if let Some(record) = self.take_record() {
                    out.push(record);
                }
                continue;
            }

            if self.overflowed {
                continue;
            }
            if self.buf.len() >= self.max_record_len {
                warn!(
                    max = self.max_record_len,
                    "record exceeds maximum length; discarding until next delimiter"
                );
                self.buf.clear();
                self.overflowed = true;
                continue;
            }
            self.buf.extend_from_slice(&[byte]);
        }
    }

    /// Consume a chunk and return the records it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Record> {
        let mut out = Vec::new();
        self.push(chunk, &mut out);
        out
    }

    /// Bytes accumulated since the last delimiter.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Drop any partial record.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    fn take_record(&mut self) -> Option<Record> {
        let raw = self.buf.split().freeze();
        if std::mem::take(&mut self.overflowed) {
            return None;
        }

        if raw.first() != Some(&FRAME_TAG) {
            trace!(len = raw.len(), "reply record");
            return Some(Record::Reply(raw));
        }

        if raw.len() != FRAME_RECORD_LEN {
            trace!(len = raw.len(), "dropping frame record of unexpected length");
            return None;
        }

        match CanMessage::decode(&raw[1..]) {
            Ok(message) => {
                trace!(address = message.address, len = message.data_length, "frame record");
                Some(Record::Frame(message))
            }
            Err(err) => {
                warn!(%err, "dropping undecodable frame record");
                None
            }
        }
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads records from any `Read` stream, one bounded read at a time.
pub struct RecordReader<T> {
    inner: T,
    parser: RecordParser,
    chunk: Vec<u8>,
    config: FrameConfig,
}

impl<T: Read> RecordReader<T> {
    /// Create a new record reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new record reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            parser: RecordParser::with_config(&config),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            config,
        }
    }

    /// Perform one read and return the records it completed (blocking).
    ///
    /// A read that returns no bytes yields no records. Read errors are
    /// returned as-is; bytes already accumulated stay buffered, so the next
    /// call picks up where this one stopped.
    pub fn read_records(&mut self) -> Result<Vec<Record>> {
        let read = loop {
            match self.inner.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        };

        Ok(self.parser.feed(&self.chunk[..read]))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Borrow the record parser.
    pub fn parser(&self) -> &RecordParser {
        &self.parser
    }

    /// Current record reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Transport> RecordReader<T> {
    /// Create a record reader for a transport and apply the read timeout from config.
    pub fn with_config_transport(mut inner: T, config: FrameConfig) -> Result<Self> {
        if let Some(timeout) = config.read_timeout {
            inner.set_read_timeout(timeout)?;
        }
        Ok(Self::with_config(inner, config))
    }
}
