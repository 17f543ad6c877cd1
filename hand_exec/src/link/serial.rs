//! Serial transport implementation

use super::{Connector, LinkError, Transport};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Serial transport for the glove's UART link
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

/// Opens [`SerialTransport`]s.
pub struct SerialConnector;

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0" or "COM3")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    /// * `read_timeout` - Longest time a single read may block for
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()?;

        log::debug!("Opened serial port: {} at {} baud", path, baud_rate);

        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout).map_err(io::Error::from)
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Connector for SerialConnector {
    fn connect(
        &mut self,
        port_id: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn Transport>, LinkError> {
        SerialTransport::open(port_id, baud_rate, read_timeout)
            .map(|t| Box::new(t) as Box<dyn Transport>)
            .map_err(|e| LinkError::Open {
                port_id: port_id.to_string(),
                reason: e.to_string(),
            })
    }
}
