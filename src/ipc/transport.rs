//! Transport layer - raw message exchange with the host process
//!
//! A [`Transport`] moves raw strings in both directions without any
//! knowledge of message format. The production implementation runs over the
//! backend's own stdin/stdout; tests use [`MockTransport`].

use async_trait::async_trait;
#[cfg(test)]
use std::collections::VecDeque;
use std::io;
#[cfg(test)]
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt, Stdin, Stdout};
use tokio::sync::mpsc;
use tracing::{error, trace};

/// Size of the read buffer for stdin reading operations
const READ_BUFFER_SIZE: usize = 4096;

/// Core transport trait for bidirectional message exchange
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a message (raw string)
    async fn send(&mut self, message: &str) -> Result<(), Self::Error>;

    /// Receive a message (raw string)
    async fn receive(&mut self) -> Result<String, Self::Error>;

    /// Close the transport
    async fn close(&mut self) -> Result<(), Self::Error>;

    /// Check if transport is still active
    fn is_connected(&self) -> bool;
}

/// Error types for the stdio transport
#[derive(Debug, thiserror::Error)]
pub enum StdioTransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport is disconnected")]
    Disconnected,

    #[error("Channel error: {0}")]
    Channel(String),
}

/// Accumulates raw bytes and hands out the longest valid UTF-8 prefix
///
/// Stdin delivers arbitrary byte chunks; a multi-byte character can be split
/// across reads, so bytes are buffered until they form valid UTF-8.
struct Utf8Accumulator {
    bytes: Vec<u8>,
}

impl Utf8Accumulator {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Take the longest valid UTF-8 prefix, leaving any incomplete trailing
    /// sequence in the buffer
    fn take_valid(&mut self) -> Option<String> {
        if self.bytes.is_empty() {
            return None;
        }

        let valid_len = match std::str::from_utf8(&self.bytes) {
            Ok(_) => self.bytes.len(),
            Err(e) => e.valid_up_to(),
        };

        if valid_len == 0 {
            return None;
        }

        let valid: Vec<u8> = self.bytes.drain(..valid_len).collect();
        // Length was validated above, so this cannot fail
        String::from_utf8(valid).ok()
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

/// Transport over the backend process's own stdin/stdout
///
/// The host writes requests to our stdin and reads responses from our
/// stdout. Reading and writing run as background tasks bridged by unbounded
/// channels so the server loop never blocks on the pipe directly.
pub struct StdioTransport {
    /// Channel feeding the stdout writer task
    outgoing: Option<mpsc::UnboundedSender<String>>,

    /// Channel fed by the stdin reader task
    incoming: Option<mpsc::UnboundedReceiver<String>>,

    /// Connection status; stdin EOF flips this via a closed channel
    connected: bool,
}

impl StdioTransport {
    /// Create a transport over the given stdin/stdout handles
    pub fn new(stdin: Stdin, stdout: Stdout) -> Self {
        let (outgoing, writer_rx) = mpsc::unbounded_channel();
        let (reader_tx, incoming) = mpsc::unbounded_channel();

        tokio::spawn(Self::stdout_writer_task(stdout, writer_rx));
        tokio::spawn(Self::stdin_reader_task(stdin, reader_tx));

        Self {
            outgoing: Some(outgoing),
            incoming: Some(incoming),
            connected: true,
        }
    }

    /// Background task that writes responses to stdout
    async fn stdout_writer_task(mut stdout: Stdout, mut rx: mpsc::UnboundedReceiver<String>) {
        while let Some(message) = rx.recv().await {
            trace!("StdioTransport: writing message ({} bytes)", message.len());

            if let Err(e) = stdout.write_all(message.as_bytes()).await {
                error!("Failed to write to stdout: {}", e);
                break;
            }

            if let Err(e) = stdout.flush().await {
                error!("Failed to flush stdout: {}", e);
                break;
            }
        }

        trace!("StdioTransport: stdout writer task finished");
    }

    /// Background task that reads request bytes from stdin
    async fn stdin_reader_task(mut stdin: Stdin, tx: mpsc::UnboundedSender<String>) {
        let mut accumulator = Utf8Accumulator::new();
        let mut read_buffer = [0u8; READ_BUFFER_SIZE];

        loop {
            match stdin.read(&mut read_buffer).await {
                Ok(0) => {
                    trace!("StdioTransport: stdin reached EOF");
                    if accumulator.remaining() > 0 {
                        error!(
                            "StdioTransport: {} incomplete UTF-8 bytes at EOF",
                            accumulator.remaining()
                        );
                    }
                    break;
                }
                Ok(n) => {
                    accumulator.push(&read_buffer[..n]);

                    if let Some(data) = accumulator.take_valid()
                        && tx.send(data).is_err()
                    {
                        trace!("StdioTransport: receiver dropped, stopping reader");
                        return;
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        trace!("StdioTransport: stdin reader task finished");
    }
}

#[async_trait]
impl Transport for StdioTransport {
    type Error = StdioTransportError;

    async fn send(&mut self, message: &str) -> Result<(), Self::Error> {
        if !self.connected {
            return Err(StdioTransportError::Disconnected);
        }

        let outgoing = self
            .outgoing
            .as_ref()
            .ok_or(StdioTransportError::Disconnected)?;

        outgoing
            .send(message.to_string())
            .map_err(|e| StdioTransportError::Channel(e.to_string()))?;

        Ok(())
    }

    async fn receive(&mut self) -> Result<String, Self::Error> {
        if !self.connected {
            return Err(StdioTransportError::Disconnected);
        }

        let incoming = self
            .incoming
            .as_mut()
            .ok_or(StdioTransportError::Disconnected)?;

        match incoming.recv().await {
            Some(data) => Ok(data),
            None => {
                // Reader task ended: stdin is gone
                self.connected = false;
                Err(StdioTransportError::Disconnected)
            }
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.connected = false;
        self.outgoing.take();
        self.incoming.take();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ============================================================================
// Mock Transport Implementation
// ============================================================================

/// Error type for mock transport
#[cfg(test)]
#[derive(Debug, thiserror::Error)]
pub enum MockTransportError {
    #[error("Transport is disconnected")]
    Disconnected,
}

/// Mock transport for testing
///
/// Returns a scripted sequence of incoming messages and captures everything
/// sent. When the script runs dry the transport reports itself
/// disconnected, which ends a server loop cleanly.
#[cfg(test)]
pub struct MockTransport {
    sent_messages: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<VecDeque<String>>>,
    connected: bool,
}

#[cfg(test)]
impl MockTransport {
    /// Create a mock transport with no scripted input
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            connected: true,
        }
    }

    /// Create a mock transport with scripted incoming messages
    pub fn with_responses(responses: Vec<String>) -> Self {
        let transport = Self::new();
        transport.responses.lock().unwrap().extend(responses);
        transport
    }

    /// All messages sent through this transport so far
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent_messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for MockTransport {
    type Error = MockTransportError;

    async fn send(&mut self, message: &str) -> Result<(), Self::Error> {
        if !self.connected {
            return Err(MockTransportError::Disconnected);
        }

        self.sent_messages.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn receive(&mut self) -> Result<String, Self::Error> {
        if !self.connected {
            return Err(MockTransportError::Disconnected);
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => Ok(response),
            None => {
                self.connected = false;
                Err(MockTransportError::Disconnected)
            }
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_captures_sent_messages() {
        let mut transport = MockTransport::new();

        transport.send("first").await.unwrap();
        transport.send("second").await.unwrap();

        assert_eq!(transport.sent_messages(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn mock_transport_returns_scripted_messages_in_order() {
        let mut transport =
            MockTransport::with_responses(vec!["one".to_string(), "two".to_string()]);

        assert_eq!(transport.receive().await.unwrap(), "one");
        assert_eq!(transport.receive().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn mock_transport_disconnects_when_script_is_exhausted() {
        let mut transport = MockTransport::with_responses(vec!["only".to_string()]);

        transport.receive().await.unwrap();
        let result = transport.receive().await;

        assert!(matches!(result, Err(MockTransportError::Disconnected)));
        assert!(!transport.is_connected());
    }

    #[test]
    fn utf8_accumulator_holds_back_split_sequences() {
        let mut accumulator = Utf8Accumulator::new();
        let euro = "€".as_bytes(); // three bytes

        accumulator.push(&euro[..2]);
        assert_eq!(accumulator.take_valid(), None);

        accumulator.push(&euro[2..]);
        assert_eq!(accumulator.take_valid().as_deref(), Some("€"));
    }

    #[test]
    fn utf8_accumulator_takes_valid_prefix_before_split_sequence() {
        let mut accumulator = Utf8Accumulator::new();
        let mut bytes = b"abc".to_vec();
        bytes.extend_from_slice(&"€".as_bytes()[..1]);

        accumulator.push(&bytes);

        assert_eq!(accumulator.take_valid().as_deref(), Some("abc"));
        assert_eq!(accumulator.remaining(), 1);
    }
}
