//! Mock transport for testing

use super::{Connector, LinkError, Transport};
use std::collections::VecDeque;
use std::io::{self, ErrorKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Longest time a read of an empty mock blocks for, capped by the port's read timeout.
const EMPTY_READ_BLOCK: Duration = Duration::from_millis(1);

/// Mock transport for unit testing.
///
/// Clones share the same buffers, so a test can keep one clone to inject data into while the
/// session owns the port handed out by [`MockConnector`].
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    read_error: Option<ErrorKind>,
    write_error: Option<ErrorKind>,
    connected: bool,
}

/// The port handed to a session. Marks the mock as disconnected when dropped.
struct MockPort {
    inner: Arc<Mutex<MockTransportInner>>,
    timeout: Duration,
}

/// Connector handing out ports on a [`MockTransport`].
pub struct MockConnector {
    transport: Option<MockTransport>,
    connects: ConnectCounter,
}

/// Number of successful connections made by a [`MockConnector`].
#[derive(Clone, Default)]
pub struct ConnectCounter(Arc<AtomicUsize>);

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        lock(&self.inner).read_buffer.extend(data);
    }

    /// Get all written data
    pub fn get_written(&self) -> Vec<u8> {
        lock(&self.inner).write_buffer.clone()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        lock(&self.inner).write_buffer.clear();
    }

    /// Clear read buffer
    pub fn clear_read(&self) {
        lock(&self.inner).read_buffer.clear();
    }

    /// Make the next read fail with the given error kind
    pub fn fail_next_read(&self, kind: ErrorKind) {
        lock(&self.inner).read_error = Some(kind);
    }

    /// Make the next write fail with the given error kind
    pub fn fail_next_write(&self, kind: ErrorKind) {
        lock(&self.inner).write_error = Some(kind);
    }

    /// Whether a session currently holds a port on this mock
    pub fn is_connected(&self) -> bool {
        lock(&self.inner).connected
    }
}

impl Transport for MockPort {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.timeout = timeout;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let available = {
            let mut inner = lock(&self.inner);

            if let Some(kind) = inner.read_error.take() {
                return Err(io::Error::new(kind, "injected read error"));
            }

            let available = inner.read_buffer.len().min(buffer.len());
            for (item, byte) in buffer.iter_mut().zip(inner.read_buffer.drain(..available)) {
                *item = byte;
            }
            available
        };

        if available == 0 {
            thread::sleep(EMPTY_READ_BLOCK.min(self.timeout));
        }

        Ok(available)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut inner = lock(&self.inner);

        if let Some(kind) = inner.write_error.take() {
            return Err(io::Error::new(kind, "injected write error"));
        }

        inner.write_buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MockPort {
    fn drop(&mut self) {
        lock(&self.inner).connected = false;
    }
}

impl MockConnector {
    /// A connector whose connections all succeed on `transport`
    pub fn new(transport: MockTransport) -> Self {
        Self {
            transport: Some(transport),
            connects: ConnectCounter::default(),
        }
    }

    /// A connector whose connections always fail, as if the port didn't exist
    pub fn failing() -> Self {
        Self {
            transport: None,
            connects: ConnectCounter::default(),
        }
    }

    /// Counter of successful connections, shared with this connector
    pub fn connect_count(&self) -> ConnectCounter {
        self.connects.clone()
    }
}

impl Connector for MockConnector {
    fn connect(
        &mut self,
        port_id: &str,
        _baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn Transport>, LinkError> {
        let transport = self.transport.as_ref().ok_or_else(|| LinkError::Open {
            port_id: port_id.to_string(),
            reason: "no such mock port".into(),
        })?;

        lock(&transport.inner).connected = true;
        self.connects.0.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockPort {
            inner: transport.inner.clone(),
            timeout: read_timeout,
        }))
    }
}

impl ConnectCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lock the shared state, recovering it if a test thread panicked while holding it.
fn lock(inner: &Arc<Mutex<MockTransportInner>>) -> MutexGuard<'_, MockTransportInner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}
