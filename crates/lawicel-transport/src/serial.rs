use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Serial port transport.
///
/// Wraps a `serialport` handle opened with the link settings from
/// [`SerialConfig`]. The port is closed when the last handle is dropped.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    port_name: String,
}

impl SerialTransport {
    /// Open the port named in `config` (blocking).
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.port_name, config.baud_rate)
            .data_bits(config.data_bits.into())
            .parity(config.parity.into())
            .stop_bits(config.stop_bits.into())
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port_name.clone(),
                source,
            })?;

        info!(
            port = %config.port_name,
            baud_rate = config.baud_rate,
            "opened serial port"
        );

        Ok(Self {
            port,
            port_name: config.port_name.clone(),
        })
    }

    /// The path this transport was opened on.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl Transport for SerialTransport {
    fn discard_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        debug!(port = %self.port_name, "discarded pending input");
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port.set_timeout(timeout).map_err(Into::into)
    }

    fn try_clone_transport(&self) -> Result<Box<dyn Transport>> {
        let port = self.port.try_clone()?;
        Ok(Box::new(Self {
            port,
            port_name: self.port_name.clone(),
        }))
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.port_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_port_reports_port_name() {
        let config = SerialConfig::new("/dev/lawicel-test-no-such-port");
        let err = SerialTransport::open(&config).unwrap_err();
        match err {
            TransportError::Open { port, .. } => {
                assert_eq!(port, "/dev/lawicel-test-no-such-port")
            }
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
