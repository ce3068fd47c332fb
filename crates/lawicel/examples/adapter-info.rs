//! Connect to an adapter and print its identification.
//!
//! Run with:
//!   cargo run --example adapter-info -- /dev/ttyUSB0

use lawicel::LawicelController;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let port = std::env::args()
        .nth(1)
        .ok_or("usage: adapter-info <serial-port>")?;

    let controller = LawicelController::new();
    controller.connect(&port)?;

    let info = controller.query_adapter_info().await;
    controller.disconnect();
    let info = info?;

    println!("port:             {port}");
    println!(
        "hardware version: {}",
        info.hardware_version.as_deref().unwrap_or("-")
    );
    println!(
        "software version: {}",
        info.software_version.as_deref().unwrap_or("-")
    );
    println!(
        "serial number:    {}",
        info.serial_number.as_deref().unwrap_or("-")
    );
    Ok(())
}
