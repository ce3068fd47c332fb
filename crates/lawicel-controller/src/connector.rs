use lawicel_transport::{SerialConfig, SerialTransport, Transport};

/// Opens the transport a controller talks through.
///
/// Closures with the matching signature are connectors too, which is how
/// tests and demos plug in an in-memory adapter.
pub trait Connector: Send + Sync {
    /// Open a fresh transport for `config`.
    fn open(&self, config: &SerialConfig) -> lawicel_transport::Result<Box<dyn Transport>>;
}

/// Opens real serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    fn open(&self, config: &SerialConfig) -> lawicel_transport::Result<Box<dyn Transport>> {
        Ok(Box::new(SerialTransport::open(config)?))
    }
}

impl<F> Connector for F
where
    F: Fn(&SerialConfig) -> lawicel_transport::Result<Box<dyn Transport>> + Send + Sync,
{
    fn open(&self, config: &SerialConfig) -> lawicel_transport::Result<Box<dyn Transport>> {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use lawicel_transport::{MemoryTransport, TransportError};

    use super::*;

    #[test]
    fn closure_connector_opens_memory_transport() {
        let (host, _device) = MemoryTransport::pair_named("mem0");
        let connector = move |_: &SerialConfig| host.try_clone_transport();

        let transport = connector.open(&SerialConfig::new("mem0")).unwrap();
        assert_eq!(transport.name(), "mem0");
    }

    #[test]
    fn serial_connector_reports_missing_port() {
        let err = SerialConnector
            .open(&SerialConfig::new("/dev/lawicel-test-missing"))
            .err()
            .expect("missing port should not open");
        assert!(matches!(err, TransportError::Open { .. }));
    }
}
