//! Transport layer for chat sessions
//!
//! A session needs exactly one reliable, ordered, bidirectional byte stream.
//! Each direction carries a sequence of frames: a `u32` little-endian length
//! prefix followed by a bincode-encoded `Message`.
//!
//! The traits here are the seams the session, supervisor and acceptor are
//! written against. `FramedConnection` implements them for any tokio byte
//! stream; `tcp` supplies the production connector and listener.

mod tcp;

pub use tcp::{TcpChatListener, TcpConnector};

use async_trait::async_trait;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter, ReadHalf, WriteHalf,
};

use crate::config::DEFAULT_MAX_FRAME_LEN;
use crate::errors::{ChatError, ChatResult};
use crate::message::Message;

// ----------------------------------------------------------------------------
// Transport Traits
// ----------------------------------------------------------------------------

/// Receiving half of a session stream
#[async_trait]
pub trait FrameReader: Send {
    /// Receive the next message.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly at a frame
    /// boundary.
    async fn recv(&mut self) -> ChatResult<Option<Message>>;
}

/// Sending half of a session stream
#[async_trait]
pub trait FrameWriter: Send {
    /// Send one message and flush it to the stream.
    async fn send(&mut self, message: &Message) -> ChatResult<()>;

    /// Flush and shut down the outbound half. The inbound half stays open.
    async fn close(&mut self) -> ChatResult<()>;
}

/// An established duplex stream that can be split into independent halves
pub trait DuplexStream: Send {
    type Reader: FrameReader;
    type Writer: FrameWriter;

    /// Human-readable description of the remote end, used in logs
    fn peer_label(&self) -> &str;

    fn into_split(self) -> (Self::Reader, Self::Writer);
}

/// Opens outbound connections (connect side)
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: DuplexStream;

    async fn connect(&self, address: &str) -> ChatResult<Self::Stream>;
}

/// Accepts inbound connections (accept side)
#[async_trait]
pub trait Listener: Send + Sync {
    type Stream: DuplexStream;

    async fn accept(&self) -> ChatResult<Self::Stream>;
}

// ----------------------------------------------------------------------------
// Length-Prefixed Framing
// ----------------------------------------------------------------------------

/// Frame reader over any async byte source
pub struct FramedReader<R> {
    inner: R,
    max_frame_len: usize,
}

impl<R> FramedReader<R> {
    pub fn new(inner: R, max_frame_len: usize) -> Self {
        Self {
            inner,
            max_frame_len,
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> FrameReader for FramedReader<R> {
    async fn recv(&mut self) -> ChatResult<Option<Message>> {
        let mut len_bytes = [0u8; 4];

        // A zero-length read before any header byte is a clean close
        if self.inner.read(&mut len_bytes[..1]).await? == 0 {
            return Ok(None);
        }
        self.inner.read_exact(&mut len_bytes[1..]).await?;

        let len = u32::from_le_bytes(len_bytes) as usize;
        if len > self.max_frame_len {
            return Err(ChatError::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        let mut data = vec![0u8; len];
        self.inner.read_exact(&mut data).await?;
        Message::from_bytes(&data).map(Some)
    }
}

/// Frame writer over any async byte sink
pub struct FramedWriter<W: AsyncWrite> {
    inner: BufWriter<W>,
    max_frame_len: usize,
}

impl<W: AsyncWrite> FramedWriter<W> {
    pub fn new(inner: W, max_frame_len: usize) -> Self {
        Self {
            inner: BufWriter::new(inner),
            max_frame_len,
        }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> FrameWriter for FramedWriter<W> {
    async fn send(&mut self, message: &Message) -> ChatResult<()> {
        let data = message.to_bytes()?;
        if data.len() > self.max_frame_len {
            return Err(ChatError::FrameTooLarge {
                len: data.len(),
                max: self.max_frame_len,
            });
        }

        self.inner.write_all(&(data.len() as u32).to_le_bytes()).await?;
        self.inner.write_all(&data).await?;
        self.inner.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> ChatResult<()> {
        self.inner.flush().await?;
        self.inner.shutdown().await?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Framed Connection
// ----------------------------------------------------------------------------

/// A byte stream carrying length-prefixed message frames in both directions
pub struct FramedConnection<S> {
    stream: S,
    peer_label: String,
    max_frame_len: usize,
}

impl<S> FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    pub fn new(stream: S, peer_label: impl Into<String>) -> Self {
        Self {
            stream,
            peer_label: peer_label.into(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }
}

impl<S> DuplexStream for FramedConnection<S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    type Reader = FramedReader<ReadHalf<S>>;
    type Writer = FramedWriter<WriteHalf<S>>;

    fn peer_label(&self) -> &str {
        &self.peer_label
    }

    fn into_split(self) -> (Self::Reader, Self::Writer) {
        let (read_half, write_half) = tokio::io::split(self.stream);
        (
            FramedReader::new(read_half, self.max_frame_len),
            FramedWriter::new(write_half, self.max_frame_len),
        )
    }
}
