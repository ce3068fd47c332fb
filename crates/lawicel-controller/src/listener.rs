//! Background read loop.
//!
//! Runs on a dedicated thread against a cloned transport handle. Each read
//! is bounded by the transport's read timeout, which is how the loop notices
//! cancellation without closing the port under itself.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use lawicel_frame::{CanMessage, FrameConfig, FrameError, Record, RecordReader};
use lawicel_transport::{is_timeout, Transport};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::correlator::ResponseCorrelator;
use crate::error::Result;

/// Where decoded records go.
#[derive(Clone)]
pub(crate) struct Dispatch {
    pub(crate) correlator: Arc<ResponseCorrelator>,
    pub(crate) messages: broadcast::Sender<CanMessage>,
    pub(crate) replies: broadcast::Sender<Bytes>,
}

impl Dispatch {
    fn deliver(&self, record: Record) {
        if let Some(tag) = record.reply_tag() {
            trace!(tag = %char::from(tag), "reply received");
        }
        match record {
            Record::Frame(message) => {
                trace!(address = message.address, len = message.data_length, "frame received");
                // No subscribers is fine.
                let _ = self.messages.send(message);
            }
            Record::Reply(reply) => {
                self.correlator.push(reply.clone());
                let _ = self.replies.send(reply);
            }
        }
    }
}

/// Handle to a running read loop.
pub(crate) struct ReadLoop {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ReadLoop {
    /// Start reading from `transport` on a new thread.
    pub(crate) fn spawn(
        transport: Box<dyn Transport>,
        config: FrameConfig,
        dispatch: Dispatch,
    ) -> Result<Self> {
        let pause = config.read_timeout.unwrap_or(Duration::from_millis(50));
        let name = format!("lawicel-reader-{}", transport.name());
        let reader = RecordReader::with_config_transport(transport, config)?;

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || run(reader, dispatch, loop_token, pause))
            .map_err(lawicel_transport::TransportError::from)?;

        Ok(Self { token, handle })
    }

    /// Ask the loop to stop after its current read.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the loop thread to exit.
    pub(crate) fn join(self) {
        self.token.cancel();
        if self.handle.join().is_err() {
            warn!("read loop panicked");
        }
    }
}

fn run(
    mut reader: RecordReader<Box<dyn Transport>>,
    dispatch: Dispatch,
    token: CancellationToken,
    pause: Duration,
) {
    debug!(transport = reader.get_ref().name(), "read loop started");

    while !token.is_cancelled() {
        match reader.read_records() {
            Ok(records) => {
                if token.is_cancelled() {
                    break;
                }
                for record in records {
                    dispatch.deliver(record);
                }
            }
            Err(FrameError::Io(err)) if is_timeout(&err) => {}
            Err(err) => {
                warn!(error = %err, "read failed, continuing");
                thread::sleep(pause);
            }
        }
    }

    debug!("read loop stopped");
}
