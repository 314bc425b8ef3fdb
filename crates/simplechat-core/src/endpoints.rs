//! Session endpoints: where outbound text comes from and where inbound
//! messages go.
//!
//! The connect side reads the interactive console directly, the accept side
//! reads the [`OutboundQueue`](crate::queue::OutboundQueue). Both sides print
//! received messages to the console.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::sync::mpsc;

use crate::errors::{ChatError, ChatResult};
use crate::message::Message;

// ----------------------------------------------------------------------------
// Endpoint Traits
// ----------------------------------------------------------------------------

/// Source of outbound message bodies for a session's writer loop
#[async_trait]
pub trait InputSource: Send {
    /// Next body to send, or `None` once input is exhausted.
    ///
    /// Implementations must be cancel safe: the session abandons a pending
    /// call when the other loop finishes first, and the same source may be
    /// handed to the next session.
    async fn next_line(&mut self) -> ChatResult<Option<String>>;
}

/// Destination for messages received from the peer
#[async_trait]
pub trait OutputSink: Send {
    async fn deliver(&mut self, message: Message) -> ChatResult<()>;
}

// ----------------------------------------------------------------------------
// Line Input
// ----------------------------------------------------------------------------

/// Line-by-line input from any buffered async reader
pub struct LinesInput<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> LinesInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

/// Interactive console input
pub type ConsoleInput = LinesInput<BufReader<Stdin>>;

impl LinesInput<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> InputSource for LinesInput<R> {
    async fn next_line(&mut self) -> ChatResult<Option<String>> {
        Ok(self.lines.next_line().await?)
    }
}

// ----------------------------------------------------------------------------
// Output Sinks
// ----------------------------------------------------------------------------

/// Prints received messages as `sender: body` lines on stdout
pub struct ConsoleOutput {
    stdout: Stdout,
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self {
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputSink for ConsoleOutput {
    async fn deliver(&mut self, message: Message) -> ChatResult<()> {
        let line = format!("{}\n", message);
        self.stdout.write_all(line.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(())
    }
}

/// Forwards received messages into an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Message>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<Message>) -> Self {
        Self { sender }
    }

    /// Create a sink together with the receiver observing it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn deliver(&mut self, message: Message) -> ChatResult<()> {
        self.sender.send(message).map_err(|_| ChatError::SinkClosed)
    }
}
