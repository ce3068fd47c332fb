//! Open the CAN channel and print received frames for a while.
//!
//! Run with:
//!   cargo run --example monitor -- /dev/ttyUSB0 500 10
//!
//! Arguments: serial port, bit rate in kbit/s (default 250), seconds to
//! listen (default 10).

use std::time::Duration;

use lawicel::{CanController, CanMessage, LawicelController};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let port = args
        .next()
        .ok_or("usage: monitor <serial-port> [kbps] [seconds]")?;
    let bitrate: u32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(250);
    let seconds: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(10);

    let controller = LawicelController::new();
    controller.connect(&port)?;
    let mut frames = controller.subscribe();
    controller.open_channel(bitrate)?;
    eprintln!("Listening on {port} at {bitrate} kbit/s for {seconds}s");

    let listen = async {
        loop {
            match frames.recv().await {
                Ok(frame) => print_frame(&frame),
                Err(RecvError::Lagged(skipped)) => eprintln!("skipped {skipped} frames"),
                Err(RecvError::Closed) => break,
            }
        }
    };
    let _ = tokio::time::timeout(Duration::from_secs(seconds), listen).await;

    controller.disconnect();
    Ok(())
}

fn print_frame(frame: &CanMessage) {
    let data: Vec<String> = frame.data.iter().map(|b| format!("{b:02X}")).collect();
    let data = data.join(" ");
    match frame.timestamp {
        Some(ts) => println!("{:03X} [{}] {data} @{ts}", frame.address, frame.data_length),
        None => println!("{:03X} [{}] {data}", frame.address, frame.data_length),
    }
}
