//! Matches adapter replies to the queries waiting for them.
//!
//! Replies are queued in arrival order by the read loop. A waiter scans the
//! queue for the first reply whose tag matches; a match empties the whole
//! queue, so replies that nobody claimed before it are dropped with it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{ControllerError, Result};

/// Queue of unclaimed replies plus a wakeup for waiters.
#[derive(Debug, Default)]
pub struct ResponseCorrelator {
    pending: Mutex<Vec<Bytes>>,
    arrived: Notify,
}

impl ResponseCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply and wake every waiter.
    pub fn push(&self, reply: Bytes) {
        trace!(len = reply.len(), "queued reply");
        self.lock().push(reply);
        self.arrived.notify_waiters();
    }

    /// Take the text of the first queued reply tagged `tag`.
    ///
    /// The text is everything after the tag byte. On a match the whole
    /// queue is cleared. Empty replies never match.
    pub fn try_take(&self, tag: u8) -> Option<String> {
        let mut pending = self.lock();
        let found = pending
            .iter()
            .find(|reply| reply.first() == Some(&tag))
            .map(|reply| String::from_utf8_lossy(&reply[1..]).into_owned())?;

        let dropped = pending.len() - 1;
        pending.clear();
        if dropped > 0 {
            debug!(tag = %char::from(tag), dropped, "cleared unclaimed replies");
        }
        Some(found)
    }

    /// Wait up to `timeout` for a reply tagged `tag`.
    pub async fn wait_for_response(&self, tag: u8, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register before checking so a push between the check and the
            // await still wakes us.
            let notified = self.arrived.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(text) = self.try_take(tag) {
                return Ok(text);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Err(ControllerError::Timeout {
                    tag: char::from(tag),
                    timeout,
                });
            }
        }
    }

    /// Number of replies waiting to be claimed.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    /// Drop every queued reply.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Bytes>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn reply(text: &'static str) -> Bytes {
        Bytes::from_static(text.as_bytes())
    }

    #[test]
    fn match_returns_text_after_tag() {
        let correlator = ResponseCorrelator::new();
        correlator.push(reply("V1013"));
        assert_eq!(correlator.try_take(b'V').as_deref(), Some("1013"));
    }

    #[test]
    fn match_clears_entire_queue() {
        let correlator = ResponseCorrelator::new();
        correlator.push(reply("z"));
        correlator.push(reply("NA1B2"));
        correlator.push(reply("V1013"));
        correlator.push(reply("N9999"));

        assert_eq!(correlator.try_take(b'N').as_deref(), Some("A1B2"));
        assert_eq!(correlator.pending_len(), 0);
        assert_eq!(correlator.try_take(b'N'), None);
    }

    #[test]
    fn no_match_leaves_queue_intact() {
        let correlator = ResponseCorrelator::new();
        correlator.push(reply("z"));
        correlator.push(Bytes::new());

        assert_eq!(correlator.try_take(b'V'), None);
        assert_eq!(correlator.pending_len(), 2);
    }

    #[test]
    fn empty_replies_never_match() {
        let correlator = ResponseCorrelator::new();
        correlator.push(Bytes::new());
        assert_eq!(correlator.try_take(0), None);
    }

    #[test]
    fn bare_tag_yields_empty_text() {
        let correlator = ResponseCorrelator::new();
        correlator.push(reply("V"));
        assert_eq!(correlator.try_take(b'V').as_deref(), Some(""));
    }

    #[tokio::test]
    async fn wait_returns_queued_reply_immediately() {
        let correlator = ResponseCorrelator::new();
        correlator.push(reply("V1013"));

        let text = correlator
            .wait_for_response(b'V', Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(text, "1013");
    }

    #[tokio::test]
    async fn wait_wakes_on_push_from_another_thread() {
        let correlator = Arc::new(ResponseCorrelator::new());
        let pusher = Arc::clone(&correlator);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            pusher.push(reply("z"));
            std::thread::sleep(Duration::from_millis(5));
            pusher.push(reply("N0042"));
        });

        let text = correlator
            .wait_for_response(b'N', Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(text, "0042");
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn wait_times_out_with_tag() {
        let correlator = ResponseCorrelator::new();
        correlator.push(reply("N1"));

        let started = std::time::Instant::now();
        let err = correlator
            .wait_for_response(b'V', Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(matches!(err, ControllerError::Timeout { tag: 'V', .. }));
        assert_eq!(correlator.pending_len(), 1);
    }
}
