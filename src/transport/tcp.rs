use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::timeout;

use crate::config::TransportConfig;
use crate::transport::{encode_frame, parse_header, Transport, TransportError, HEADER_SIZE};

/// Reading half of a framed connection.
pub struct FrameReader<R> {
    inner: R,
    config: TransportConfig,
}

impl<R: AsyncRead + Unpin + Send> FrameReader<R> {
    pub fn new(inner: R, config: TransportConfig) -> Self {
        Self { inner, config }
    }

    /// Read one whole frame and decode its JSON payload.
    pub async fn read_value(&mut self) -> Result<Value, TransportError> {
        match self.config.receive_timeout {
            Some(limit) => timeout(limit, self.read_frame())
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => self.read_frame().await,
        }
    }

    async fn read_frame(&mut self) -> Result<Value, TransportError> {
        // A short header, including zero bytes, means the peer went away.
        let mut header = [0u8; HEADER_SIZE];
        self.inner
            .read_exact(&mut header)
            .await
            .map_err(TransportError::from_io)?;

        let len = parse_header(&header)?;
        if len > self.config.max_payload {
            return Err(TransportError::FrameTooLarge {
                len,
                max: self.config.max_payload,
            });
        }

        let mut payload = vec![0u8; len];
        self.inner
            .read_exact(&mut payload)
            .await
            .map_err(TransportError::from_io)?;
        log::trace!("received frame of {} bytes", len);

        serde_json::from_slice(&payload).map_err(TransportError::Decode)
    }
}

/// Writing half of a framed connection.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Serialize `value` and write it as one frame.
    pub async fn write_value<T: Serialize + Sync + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), TransportError> {
        let frame = encode_frame(value)?;
        self.inner
            .write_all(&frame)
            .await
            .map_err(TransportError::from_io)?;
        self.inner.flush().await.map_err(TransportError::from_io)?;
        log::trace!("sent frame of {} bytes", frame.len() - HEADER_SIZE);
        Ok(())
    }
}

/// Framed transport over a pair of stream halves.
pub struct StreamTransport<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

/// Framed transport over a TCP connection.
pub type TcpTransport = StreamTransport<OwnedReadHalf, OwnedWriteHalf>;

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, TransportConfig::default())
    }

    pub fn with_config(stream: TcpStream, config: TransportConfig) -> Self {
        // Frames are small and turn-based; don't let Nagle hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("could not set TCP_NODELAY: {}", e);
        }
        let (read, write) = stream.into_split();
        Self::from_parts(read, write, config)
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Send> StreamTransport<ReadHalf<S>, WriteHalf<S>> {
    /// Framed transport over any bidirectional stream, e.g. an in-process duplex pipe.
    pub fn from_stream(stream: S, config: TransportConfig) -> Self {
        let (read, write) = tokio::io::split(stream);
        Self::from_parts(read, write, config)
    }
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn from_parts(read: R, write: W, config: TransportConfig) -> Self {
        Self {
            reader: FrameReader::new(read, config),
            writer: FrameWriter::new(write),
        }
    }

    /// Separate the halves so reads can run on their own task.
    pub fn into_split(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }
}

#[async_trait::async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, value: &Value) -> Result<(), TransportError> {
        self.writer.write_value(value).await
    }

    async fn recv(&mut self) -> Result<Value, TransportError> {
        self.reader.read_value().await
    }
}
