use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use lawicel_frame::{bitrate_code, CanMessage, Command, CommandWriter};
use lawicel_transport::Transport;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::connector::{Connector, SerialConnector};
use crate::correlator::ResponseCorrelator;
use crate::error::{ControllerError, Result};
use crate::info::AdapterInfo;
use crate::listener::{Dispatch, ReadLoop};
use crate::traits::CanController;

type Writer = CommandWriter<Box<dyn Transport>>;

/// Link and channel state of a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Serial link open, CAN channel closed.
    ChannelClosed,
    /// Serial link open, CAN channel open.
    ChannelOpen,
}

#[derive(Default)]
struct Status {
    state: ConnectionState,
    port_name: Option<String>,
}

/// Controller for one Lawicel adapter.
///
/// Every operation takes `&self`; share the controller with `Arc` to send
/// from several threads. Outbound commands are written under one lock so
/// they never interleave. Received frames and replies are read on a
/// background thread and published to subscribers.
pub struct LawicelController {
    config: ControllerConfig,
    connector: Box<dyn Connector>,
    status: Mutex<Status>,
    /// Held for the whole of connect and disconnect.
    read_loop: Mutex<Option<ReadLoop>>,
    writer: Mutex<Option<Writer>>,
    correlator: Arc<ResponseCorrelator>,
    messages: broadcast::Sender<CanMessage>,
    replies: broadcast::Sender<Bytes>,
    info: Mutex<AdapterInfo>,
}

impl LawicelController {
    /// Controller using serial ports and default configuration.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Controller using serial ports.
    pub fn with_config(config: ControllerConfig) -> Self {
        Self::with_connector(config, SerialConnector)
    }

    /// Controller opening its transport through `connector`.
    pub fn with_connector(config: ControllerConfig, connector: impl Connector + 'static) -> Self {
        let capacity = config.event_capacity.max(1);
        let (messages, _) = broadcast::channel(capacity);
        let (replies, _) = broadcast::channel(capacity);
        Self {
            config,
            connector: Box::new(connector),
            status: Mutex::new(Status::default()),
            read_loop: Mutex::new(None),
            writer: Mutex::new(None),
            correlator: Arc::new(ResponseCorrelator::new()),
            messages,
            replies,
            info: Mutex::new(AdapterInfo::default()),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.lock_status().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() != ConnectionState::Disconnected
    }

    pub fn is_channel_open(&self) -> bool {
        self.state() == ConnectionState::ChannelOpen
    }

    /// Port of the current connection.
    pub fn port_name(&self) -> Option<String> {
        self.lock_status().port_name.clone()
    }

    /// Open the serial link to the adapter on `port_name`.
    ///
    /// An existing connection is torn down first. Stale input is discarded,
    /// two flush lines are sent, and the read loop is started. The channel
    /// is left closed.
    pub fn connect(&self, port_name: &str) -> Result<()> {
        let mut read_loop = self.lock_read_loop();
        if read_loop.is_some() || self.is_connected() {
            self.teardown(&mut read_loop);
        }

        match self.establish(port_name) {
            Ok(started) => {
                *read_loop = Some(started);
                let mut status = self.lock_status();
                status.state = ConnectionState::ChannelClosed;
                status.port_name = Some(port_name.to_owned());
                info!(port = port_name, "connected");
                Ok(())
            }
            Err(err) => {
                self.lock_writer().take();
                Err(err)
            }
        }
    }

    fn establish(&self, port_name: &str) -> Result<ReadLoop> {
        let serial = self.config.serial_for(port_name);
        let mut transport = self.connector.open(&serial)?;
        transport.discard_input()?;
        let reader_port = transport.try_clone_transport()?;

        *self.lock_writer() = Some(CommandWriter::new(transport));
        self.send(&Command::Flush)?;
        self.send(&Command::Flush)?;

        self.correlator.clear();
        let dispatch = Dispatch {
            correlator: Arc::clone(&self.correlator),
            messages: self.messages.clone(),
            replies: self.replies.clone(),
        };
        ReadLoop::spawn(reader_port, self.config.frame_config(), dispatch)
    }

    /// Close the link. Closes the channel first when it is open.
    ///
    /// Blocks for twice the settle delay while in-flight bytes drain.
    /// Does nothing when already disconnected.
    pub fn disconnect(&self) {
        let mut read_loop = self.lock_read_loop();
        self.teardown(&mut read_loop);
    }

    fn teardown(&self, read_loop: &mut Option<ReadLoop>) {
        if self.is_channel_open() {
            if let Err(err) = self.close_channel() {
                warn!(error = %err, "failed to close channel during disconnect");
            }
        }

        if let Some(running) = read_loop.take() {
            let settle = self.config.settle_delay;
            running.cancel();
            thread::sleep(settle);
            running.join();

            let writer = self.lock_writer().take();
            if let Some(mut writer) = writer {
                if let Err(err) = writer.get_mut().discard_input() {
                    warn!(error = %err, "failed to discard input during disconnect");
                }
                thread::sleep(settle);
                debug!(transport = writer.get_ref().name(), "releasing transport");
            }
            info!("disconnected");
        }

        let mut status = self.lock_status();
        status.state = ConnectionState::Disconnected;
        status.port_name = None;
    }

    /// Write raw command text followed by the terminator.
    pub fn send_command(&self, text: &str) -> Result<()> {
        let mut writer = self.lock_writer();
        let writer = writer.as_mut().ok_or(ControllerError::NotConnected)?;
        writer.send_text(text)?;
        Ok(())
    }

    fn send(&self, command: &Command<'_>) -> Result<()> {
        let mut writer = self.lock_writer();
        let writer = writer.as_mut().ok_or(ControllerError::NotConnected)?;
        writer.send(command)?;
        Ok(())
    }

    /// Wait for a reply tagged `tag` and return its text.
    ///
    /// A match clears every other reply still queued.
    pub async fn wait_for_response(&self, tag: u8, timeout: Duration) -> Result<String> {
        self.correlator.wait_for_response(tag, timeout).await
    }

    /// Ask the adapter for its firmware version.
    pub async fn get_version(&self) -> Result<String> {
        self.query(&Command::Version).await
    }

    /// Ask the adapter for its serial number.
    pub async fn get_serial_number(&self) -> Result<String> {
        self.query(&Command::SerialNumber).await
    }

    /// Send `command` and wait for the reply carrying its tag. Commands
    /// that solicit no reply return empty text once written.
    pub async fn query(&self, command: &Command<'_>) -> Result<String> {
        self.send(command)?;
        match command.reply_tag() {
            Some(tag) => self.wait_for_response(tag, self.config.response_timeout).await,
            None => Ok(String::new()),
        }
    }

    /// Query version and serial number and remember them.
    pub async fn query_adapter_info(&self) -> Result<AdapterInfo> {
        let version = self.get_version().await?;
        let serial_number = self.get_serial_number().await?;
        let info = AdapterInfo::from_replies(&version, &serial_number);
        debug!(?info, "adapter identified");
        *self.lock_info() = info.clone();
        Ok(info)
    }

    /// Identification from the last [`query_adapter_info`](Self::query_adapter_info).
    pub fn adapter_info(&self) -> AdapterInfo {
        self.lock_info().clone()
    }

    /// Receive every reply record that is not a CAN frame, tag included.
    pub fn subscribe_replies(&self) -> broadcast::Receiver<Bytes> {
        self.replies.subscribe()
    }

    /// Replies received but not yet claimed by a waiter.
    pub fn pending_replies(&self) -> usize {
        self.correlator.pending_len()
    }

    fn set_state(&self, state: ConnectionState) {
        self.lock_status().state = state;
    }

    fn lock_status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_read_loop(&self) -> MutexGuard<'_, Option<ReadLoop>> {
        self.read_loop.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_writer(&self) -> MutexGuard<'_, Option<Writer>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_info(&self) -> MutexGuard<'_, AdapterInfo> {
        self.info.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CanController for LawicelController {
    /// Sends auto-poll, bit rate and open, then marks the channel open
    /// without waiting for the adapter to acknowledge.
    fn open_channel(&self, bitrate_kbps: u32) -> Result<()> {
        self.send(&Command::AutoPoll)?;
        self.send(&Command::SetBitRate(bitrate_code(bitrate_kbps)))?;
        self.send(&Command::Open)?;
        self.set_state(ConnectionState::ChannelOpen);
        debug!(bitrate_kbps, "channel open");
        Ok(())
    }

    fn close_channel(&self) -> Result<()> {
        self.send(&Command::Close)?;
        self.set_state(ConnectionState::ChannelClosed);
        debug!("channel closed");
        Ok(())
    }

    fn send_message(&self, message: &CanMessage) -> Result<()> {
        self.send(&Command::Transmit(message))
    }

    fn subscribe(&self) -> broadcast::Receiver<CanMessage> {
        self.messages.subscribe()
    }
}

impl Default for LawicelController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LawicelController {
    fn drop(&mut self) {
        let mut read_loop = self.lock_read_loop();
        if read_loop.is_some() {
            self.teardown(&mut read_loop);
        }
    }
}

impl std::fmt::Debug for LawicelController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.lock_status();
        f.debug_struct("LawicelController")
            .field("state", &status.state)
            .field("port_name", &status.port_name)
            .finish()
    }
}
