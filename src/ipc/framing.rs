//! Message framing layer
//!
//! Frames backend messages using Content-Length headers over any
//! [`Transport`]:
//!
//! Content-Length: <length>\r\n\r\n<content>

use crate::ipc::transport::Transport;
use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::trace;

/// Error types for message framing
#[derive(Debug, thiserror::Error)]
pub enum FramingError<T: std::error::Error + Send + Sync + 'static> {
    #[error("Transport error: {0}")]
    Transport(T),

    #[error("Transport disconnected")]
    Disconnected,

    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Invalid content length: {0}")]
    InvalidContentLength(String),

    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Maximum message size to prevent memory exhaustion
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Content-Length framing wrapper
///
/// Wraps a transport so callers exchange complete message payloads while
/// the underlying transport moves raw, possibly fragmented, strings.
pub struct MessageFraming<T: Transport> {
    transport: T,

    /// Buffer accumulating partially received frames
    receive_buffer: String,

    /// Complete payloads ready to be handed out
    message_queue: VecDeque<String>,
}

impl<T: Transport> MessageFraming<T> {
    /// Create a framing wrapper around a transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            receive_buffer: String::new(),
            message_queue: VecDeque::new(),
        }
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Try to extract one complete payload from the receive buffer
    ///
    /// Returns `Ok(None)` when more data is needed.
    fn try_parse_message(&mut self) -> Result<Option<String>, FramingError<T::Error>> {
        let Some(header_end) = self.receive_buffer.find("\r\n\r\n") else {
            return Ok(None);
        };

        let content_length = parse_content_length::<T>(&self.receive_buffer[..header_end])?;
        let content_start = header_end + 4;

        let available = self.receive_buffer.len() - content_start;
        if available < content_length {
            trace!(
                "MessageFraming: incomplete frame, waiting for {} more bytes",
                content_length - available
            );
            return Ok(None);
        }

        let payload =
            self.receive_buffer[content_start..content_start + content_length].to_string();
        self.receive_buffer.drain(..content_start + content_length);

        trace!("MessageFraming: parsed complete frame ({} bytes)", content_length);
        Ok(Some(payload))
    }

    /// Pull data from the transport and queue any completed frames
    async fn fill_from_transport(&mut self) -> Result<(), FramingError<T::Error>> {
        let new_data = match self.transport.receive().await {
            Ok(data) => data,
            Err(e) if !self.transport.is_connected() => {
                // Treat errors on a dead transport as a plain disconnect;
                // the session is over either way
                trace!("MessageFraming: transport disconnected ({})", e);
                return Err(FramingError::Disconnected);
            }
            Err(e) => return Err(FramingError::Transport(e)),
        };

        self.receive_buffer.push_str(&new_data);

        while let Some(payload) = self.try_parse_message()? {
            self.message_queue.push_back(payload);
        }

        Ok(())
    }
}

/// Parse the Content-Length value out of a frame header
fn parse_content_length<T: Transport>(header: &str) -> Result<usize, FramingError<T::Error>> {
    for line in header.lines() {
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let value = value.trim();
            let length = value
                .parse::<usize>()
                .map_err(|_| FramingError::InvalidContentLength(value.to_string()))?;

            if length > MAX_MESSAGE_SIZE {
                return Err(FramingError::MessageTooLarge {
                    size: length,
                    max: MAX_MESSAGE_SIZE,
                });
            }

            return Ok(length);
        }
    }

    Err(FramingError::InvalidFormat(
        "Missing Content-Length header".to_string(),
    ))
}

#[async_trait]
impl<T: Transport> Transport for MessageFraming<T> {
    type Error = FramingError<T::Error>;

    async fn send(&mut self, message: &str) -> Result<(), Self::Error> {
        let framed = format!("Content-Length: {}\r\n\r\n{}", message.len(), message);

        trace!(
            "MessageFraming: sending frame ({} bytes content)",
            message.len()
        );

        match self.transport.send(&framed).await {
            Ok(()) => Ok(()),
            Err(_) if !self.transport.is_connected() => Err(FramingError::Disconnected),
            Err(e) => Err(FramingError::Transport(e)),
        }
    }

    async fn receive(&mut self) -> Result<String, Self::Error> {
        loop {
            if let Some(payload) = self.message_queue.pop_front() {
                return Ok(payload);
            }

            if !self.transport.is_connected() {
                return Err(FramingError::Disconnected);
            }

            self.fill_from_transport().await?;
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.transport
            .close()
            .await
            .map_err(FramingError::Transport)
    }

    fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}
