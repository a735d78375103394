//! Length-prefixed JSON framing shared by the server and the client.
//!
//! Every frame is a fixed-width ASCII header holding the payload length in
//! decimal, left-justified and padded with spaces, followed by the UTF-8 JSON
//! payload itself:
//!
//! ```text
//! 25        ["Destroyer",[0,0],[1,0]]
//! ```

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

pub mod in_memory;
pub mod inbox;
pub mod tcp;

pub use in_memory::InMemoryTransport;
pub use inbox::Inbox;
pub use tcp::{FrameReader, FrameWriter, StreamTransport, TcpTransport};

/// Width of the length header in bytes.
pub const HEADER_SIZE: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Peer closed the connection, reset it, or stopped mid-frame.
    #[error("connection closed by peer")]
    Disconnected,
    #[error("malformed frame header {0:?}")]
    MalformedHeader(String),
    #[error("frame too large: {len} bytes (max: {max})")]
    FrameTooLarge { len: usize, max: usize },
    #[error("receive timeout after {0:?}")]
    Timeout(Duration),
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Map read/write errors that mean "the other side is gone".
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => TransportError::Disconnected,
            _ => TransportError::Io(err),
        }
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, TransportError::Disconnected)
    }
}

/// A connection that moves whole JSON values.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, value: &Value) -> Result<(), TransportError>;
    async fn recv(&mut self) -> Result<Value, TransportError>;
}

/// Header announcing a payload of `len` bytes.
pub fn encode_header(len: usize) -> Result<[u8; HEADER_SIZE], TransportError> {
    let digits = len.to_string();
    if digits.len() > HEADER_SIZE {
        return Err(TransportError::FrameTooLarge {
            len,
            max: 10usize.pow(HEADER_SIZE as u32) - 1,
        });
    }
    let mut header = [b' '; HEADER_SIZE];
    header[..digits.len()].copy_from_slice(digits.as_bytes());
    Ok(header)
}

/// Payload length announced by a header.
pub fn parse_header(header: &[u8]) -> Result<usize, TransportError> {
    let text = std::str::from_utf8(header).map_err(|_| {
        TransportError::MalformedHeader(String::from_utf8_lossy(header).into_owned())
    })?;
    text.trim()
        .parse()
        .map_err(|_| TransportError::MalformedHeader(text.to_string()))
}

/// Header and payload for `value`, ready to be written.
pub fn encode_frame<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, TransportError> {
    let payload = serde_json::to_vec(value).map_err(TransportError::Encode)?;
    let header = encode_header(payload.len())?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&header);
    frame.extend_from_slice(&payload);
    Ok(frame)
}
