//! End-to-end sessions against an emulated adapter on the in-memory link.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use lawicel::controller::ConnectionState;
use lawicel::transport::{MemoryDevice, MemoryTransport, SerialConfig, Transport};
use lawicel::{CanController, CanMessage, ControllerConfig, ControllerError, LawicelController};
use tokio::sync::broadcast;

/// Answers queries and loops transmitted 8-byte frames back, as an adapter
/// in loopback mode would.
struct Emulator {
    stop: Arc<AtomicBool>,
    commands: Arc<Mutex<Vec<String>>>,
    handle: Option<JoinHandle<()>>,
}

impl Emulator {
    fn start(device: MemoryDevice) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let commands = Arc::new(Mutex::new(Vec::new()));
        let handle = {
            let stop = Arc::clone(&stop);
            let commands = Arc::clone(&commands);
            thread::spawn(move || {
                let mut pending = Vec::new();
                while !stop.load(Ordering::SeqCst) {
                    pending.extend(device.take_written());
                    while let Some(pos) = pending.iter().position(|b| *b == b'\r') {
                        let line: Vec<u8> = pending.drain(..=pos).collect();
                        let line = String::from_utf8_lossy(&line[..pos]).into_owned();
                        if let Some(reply) = answer(&line) {
                            device.push(reply);
                        }
                        commands.lock().unwrap().push(line);
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            })
        };
        Self {
            stop,
            commands,
            handle: Some(handle),
        }
    }

    /// Commands seen so far, once at least `count` have arrived.
    fn wait_for_commands(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let commands = self.commands.lock().unwrap().clone();
            if commands.len() >= count || Instant::now() >= deadline {
                return commands;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

fn answer(line: &str) -> Option<String> {
    match line {
        "V" => Some("V1013\r".to_owned()),
        "N" => Some("NA1B2\r".to_owned()),
        frame if frame.starts_with('t') && frame.len() == 21 => Some(format!("{frame}\r")),
        _ => None,
    }
}

fn controller_for(device_slot: &mut Option<MemoryDevice>) -> LawicelController {
    let (host, device) = MemoryTransport::pair_named("emulated");
    *device_slot = Some(device);

    let mut config = ControllerConfig {
        settle_delay: Duration::from_millis(2),
        response_timeout: Duration::from_millis(500),
        ..ControllerConfig::default()
    };
    config.serial.read_timeout = Duration::from_millis(5);

    LawicelController::with_connector(config, move |_: &SerialConfig| host.try_clone_transport())
}

async fn recv<T: Clone>(rx: &mut broadcast::Receiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("receive timed out")
        .expect("channel closed")
}

#[tokio::test]
async fn full_session_against_emulated_adapter() {
    let mut device = None;
    let controller = controller_for(&mut device);
    let emulator = Emulator::start(device.unwrap());

    controller.connect("emulated").unwrap();
    let info = controller.query_adapter_info().await.unwrap();
    assert_eq!(info.hardware_version.as_deref(), Some("10"));
    assert_eq!(info.software_version.as_deref(), Some("13"));
    assert_eq!(info.serial_number.as_deref(), Some("A1B2"));

    let mut frames = controller.subscribe();
    controller.open_channel(500).unwrap();
    assert_eq!(controller.state(), ConnectionState::ChannelOpen);

    let sent = CanMessage::new(0x321, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    controller.send_message(&sent).unwrap();
    assert_eq!(recv(&mut frames).await, sent);

    controller.disconnect();
    assert_eq!(controller.state(), ConnectionState::Disconnected);

    let commands = emulator.wait_for_commands(11);
    assert_eq!(commands[..6], ["", "", "", "", "V", "N"]);
    assert_eq!(commands[6..], ["X1", "S6", "O", "t32180102030405060708", "C"]);
}

#[tokio::test]
async fn short_transmit_is_not_looped_back_as_frame() {
    let mut device = None;
    let controller = controller_for(&mut device);
    let _emulator = Emulator::start(device.unwrap());

    controller.connect("emulated").unwrap();
    let mut frames = controller.subscribe();
    let mut replies = controller.subscribe_replies();
    controller.open_channel(250).unwrap();

    controller
        .send_message(&CanMessage::new(0x123, vec![0xAB, 0xCD]))
        .unwrap();
    controller.send_command("V").unwrap();

    assert_eq!(recv(&mut replies).await, Bytes::from_static(b"V1013"));
    assert!(frames.try_recv().is_err());
}

#[tokio::test]
async fn unanswered_query_times_out() {
    let mut device = None;
    let controller = controller_for(&mut device);
    let device = device.unwrap();
    controller.connect("emulated").unwrap();

    let started = Instant::now();
    let err = controller.get_serial_number().await.unwrap_err();

    assert!(matches!(err, ControllerError::Timeout { tag: 'N', .. }));
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(device.written().ends_with(b"N\r"));
}

#[tokio::test]
async fn frames_split_across_reads_are_reassembled() {
    let mut device = None;
    let controller = controller_for(&mut device);
    let device = device.unwrap();
    device.set_max_read(Some(3));
    controller.connect("emulated").unwrap();
    let mut frames = controller.subscribe();

    device.push(b"t1238DEADBEEF01020304\rt4560\rt7FF80102030405060708\r");

    let first = recv(&mut frames).await;
    assert_eq!(first.address, 0x123);
    let second = recv(&mut frames).await;
    assert_eq!(second.address, 0x7FF);
    assert_eq!(second.data.as_ref(), &[1, 2, 3, 4, 5, 6, 7, 8]);
}

#[tokio::test]
async fn read_size_does_not_change_received_frames() {
    let mut device = None;
    let controller = controller_for(&mut device);
    let device = device.unwrap();
    controller.connect("emulated").unwrap();
    let mut frames = controller.subscribe();
    let mut replies = controller.subscribe_replies();

    for max_read in [1, 2, 3, 5, 7, 11, 13, 20, 21, 22, 64] {
        device.set_max_read(Some(max_read));
        let mut stream = Vec::new();
        for n in 0..6u32 {
            let message = CanMessage::new(0x100 + n, vec![n as u8; 8]);
            stream.extend_from_slice(message.transmit_command().as_bytes());
            stream.extend_from_slice(b"\rt12\rz\r");
        }
        device.push(&stream);

        for n in 0..6u32 {
            let frame = recv(&mut frames).await;
            assert_eq!(frame.address, 0x100 + n, "read size {max_read}");
            assert_eq!(frame.data.as_ref(), &[n as u8; 8]);
            assert_eq!(recv(&mut replies).await, Bytes::from_static(b"z"));
        }
    }
    assert!(frames.try_recv().is_err());
}

#[test]
fn controller_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LawicelController>();
}
