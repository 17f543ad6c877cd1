//! # Link session module
//!
//! Owns the duplex byte stream to the glove microcontroller. The session reads one line per call,
//! bounded by the configured read timeout, and writes command lines back down the same stream.
//!
//! The session moves through `Closed -> Opening -> Streaming -> Closed`. Read and write failures
//! are reported to the caller but never close the session, only [`LinkSession::close`] (or
//! dropping the session) does that.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// In-memory transport used by tests and benchmarks.
pub mod mock;

/// Serial port transport.
mod serial;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info, trace, warn};
use std::io::{self, ErrorKind};
use std::time::{Duration, Instant};

pub use serial::{SerialConnector, SerialTransport};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest line accepted before the partial line is thrown away.
pub const MAX_LINE_LEN: usize = 512;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A byte stream to the microcontroller.
pub trait Transport: Send {
    /// Set how long a single [`Transport::read`] may block for.
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Read bytes into `buffer`, blocking for at most the transport's read timeout.
    ///
    /// `Ok(0)` means no data arrived before the timeout.
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data` to the stream.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush any pending writes.
    fn flush(&mut self) -> io::Result<()>;
}

/// Acquires a [`Transport`] for a port.
pub trait Connector: Send {
    fn connect(
        &mut self,
        port_id: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn Transport>, LinkError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A session over a line oriented link.
pub struct LinkSession {
    connector: Box<dyn Connector>,

    transport: Option<Box<dyn Transport>>,

    state: LinkState,

    read_timeout: Duration,

    /// Bytes of the line currently being received. Kept across timeouts so that a line split over
    /// two reads is not lost.
    line_buf: Vec<u8>,

    port_id: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Lifecycle state of a [`LinkSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Closed,
    Opening,
    Streaming,
}

/// Errors which can occur when opening or writing to the link.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("Could not open the link on {port_id}: {reason}")]
    Open { port_id: String, reason: String },

    #[error("Invalid link configuration: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),
}

/// Reasons a line could not be read this time round.
#[derive(thiserror::Error, Debug)]
pub enum LinkReadError {
    /// No complete line arrived within the read timeout. This is expected and not a fault.
    #[error("No complete line received before the timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("Line exceeded {} bytes without a terminator and was discarded", MAX_LINE_LEN)]
    LineTooLong,

    /// The session isn't streaming, so there is nothing to read.
    #[error("The link is not open")]
    Closed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LinkSession {
    /// Create a new closed session which will acquire its transport from `connector`.
    pub fn new(connector: Box<dyn Connector>, read_timeout: Duration) -> Self {
        Self {
            connector,
            transport: None,
            state: LinkState::Closed,
            read_timeout,
            line_buf: Vec::with_capacity(MAX_LINE_LEN),
            port_id: None,
        }
    }

    /// Create a new closed session over a serial port.
    pub fn serial(read_timeout: Duration) -> Self {
        Self::new(Box::new(SerialConnector), read_timeout)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_streaming(&self) -> bool {
        self.state == LinkState::Streaming
    }

    /// Configured read timeout.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Open the link.
    ///
    /// Does nothing if the link is already streaming. On failure the session returns to
    /// `Closed`, no retry is attempted.
    pub fn open(&mut self, port_id: &str, baud_rate: u32) -> Result<(), LinkError> {
        if self.is_streaming() {
            debug!(
                "Link already open on {}, ignoring open request for {}",
                self.port_id.as_deref().unwrap_or("?"),
                port_id
            );
            return Ok(());
        }

        if port_id.is_empty() {
            return Err(LinkError::Config("port identifier is empty".into()));
        }
        if baud_rate == 0 {
            return Err(LinkError::Config("baud rate must be non-zero".into()));
        }

        self.state = LinkState::Opening;

        match self.connector.connect(port_id, baud_rate, self.read_timeout) {
            Ok(t) => {
                self.transport = Some(t);
                self.line_buf.clear();
                self.port_id = Some(port_id.to_string());
                self.state = LinkState::Streaming;

                info!(
                    "Link opened on {} at {} baud ({} ms read timeout)",
                    port_id,
                    baud_rate,
                    self.read_timeout.as_millis()
                );

                Ok(())
            }
            Err(e) => {
                self.state = LinkState::Closed;
                error!("Failed to open link: {}", e);
                Err(e)
            }
        }
    }

    /// Read one line from the link, without its terminator.
    ///
    /// Blocks for at most the read timeout, the transport's own timeout is shortened before each
    /// read so a late byte can't extend the call. Partially received lines are kept and completed
    /// on the next call.
    pub fn read_frame_line(&mut self) -> Result<String, LinkReadError> {
        if !self.is_streaming() {
            return Err(LinkReadError::Closed);
        }

        let transport = match self.transport.as_mut() {
            Some(t) => t,
            None => return Err(LinkReadError::Closed),
        };

        let deadline = Instant::now() + self.read_timeout;

        // Read a single byte at a time so nothing past the end of the current line is taken from
        // the stream.
        let mut byte = [0u8; 1];

        loop {
            // Each read may only block for what is left of this call's timeout
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining == Duration::from_secs(0) {
                return Err(LinkReadError::Timeout);
            }
            transport.set_timeout(remaining)?;

            match transport.read(&mut byte) {
                Ok(0) => (),
                Ok(_) => {
                    if byte[0] == b'\n' {
                        if self.line_buf.last() == Some(&b'\r') {
                            self.line_buf.pop();
                        }
                        let line = String::from_utf8_lossy(&self.line_buf).into_owned();
                        self.line_buf.clear();
                        return Ok(line);
                    }

                    self.line_buf.push(byte[0]);

                    if self.line_buf.len() > MAX_LINE_LEN {
                        self.line_buf.clear();
                        return Err(LinkReadError::LineTooLong);
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => (),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkReadError::Transport(e)),
            }
        }
    }

    /// Write one line to the link.
    ///
    /// If the link is not streaming the line is dropped and `Ok(())` is returned.
    pub fn write_command_line(&mut self, line: &str) -> Result<(), LinkError> {
        let transport = match (self.state, self.transport.as_mut()) {
            (LinkState::Streaming, Some(t)) => t,
            _ => {
                trace!("Link not open, dropping command line {:?}", line);
                return Ok(());
            }
        };

        transport.write_all(line.as_bytes())?;
        transport.flush()?;

        trace!("Sent command line {:?}", line);

        Ok(())
    }

    /// Close the link, releasing the transport.
    ///
    /// Safe to call any number of times, and called automatically when the session is dropped.
    pub fn close(&mut self) {
        if let Some(mut t) = self.transport.take() {
            if let Err(e) = t.flush() {
                warn!("Could not flush link before closing: {}", e);
            }

            info!(
                "Link on {} closed",
                self.port_id.as_deref().unwrap_or("?")
            );
        }

        self.line_buf.clear();
        self.port_id = None;
        self.state = LinkState::Closed;
    }
}

impl Drop for LinkSession {
    fn drop(&mut self) {
        self.close();
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
