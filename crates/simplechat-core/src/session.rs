//! Duplex session
//!
//! A session owns one established stream and runs two loops over it:
//! - the reader loop moves messages from the stream to an [`OutputSink`]
//! - the writer loop moves bodies from an [`InputSource`] to the stream
//!
//! Both loops share one cancellation token. Whichever loop exits first
//! cancels the other, and [`DuplexSession::run`] returns only after both have
//! stopped. A session is consumed by `run`; every connection gets a new one.

use core::fmt;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::endpoints::{InputSource, OutputSink};
use crate::message::Message;
use crate::transport::{DuplexStream, FrameReader, FrameWriter};

// ----------------------------------------------------------------------------
// Session State
// ----------------------------------------------------------------------------

/// Lifecycle of a single session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Stream established, loops not started yet
    Idle,
    /// Reader and writer both running
    Active,
    /// One loop stopped, cancellation issued, waiting for the other
    Draining,
    /// Both loops stopped. Terminal.
    Closed,
}

/// Why a session ended
///
/// Deliberately coarse: callers treat every outcome the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The peer closed its sending half
    PeerClosed,
    /// Local input ran out and the outbound half was closed
    InputClosed,
    /// The stream or the output sink failed
    ConnectionLost(String),
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::PeerClosed => write!(f, "disconnected gracefully"),
            SessionOutcome::InputClosed => write!(f, "local input closed"),
            SessionOutcome::ConnectionLost(reason) => write!(f, "connection lost: {}", reason),
        }
    }
}

/// Summary returned by [`DuplexSession::run`]
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub outcome: SessionOutcome,
    /// Sender name of the first message received from the peer
    pub peer_name: Option<String>,
    pub messages_sent: u64,
    pub messages_received: u64,
}

// ----------------------------------------------------------------------------
// Loop Results
// ----------------------------------------------------------------------------

enum LoopExit {
    Finished(SessionOutcome),
    Cancelled,
}

struct ReaderSummary {
    exit: LoopExit,
    peer_name: Option<String>,
    received: u64,
}

struct WriterSummary {
    exit: LoopExit,
    sent: u64,
}

// ----------------------------------------------------------------------------
// Duplex Session
// ----------------------------------------------------------------------------

/// One message exchange between two named participants over one stream
pub struct DuplexSession {
    id: Uuid,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
}

impl DuplexSession {
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            id: Uuid::new_v4(),
            config,
            state,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Observe state transitions, including the final `Closed`
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        debug!("Session state {:?} -> {:?}", previous, next);
    }

    /// Exchange messages over `stream` until either direction finishes.
    pub async fn run<S, I, O>(self, stream: S, input: &mut I, output: &mut O) -> SessionReport
    where
        S: DuplexStream,
        I: InputSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        let span = info_span!(
            "session",
            id = %self.id,
            local = %self.config.local_name,
            peer = %stream.peer_label(),
        );
        self.exchange(stream, input, output).instrument(span).await
    }

    async fn exchange<S, I, O>(self, stream: S, input: &mut I, output: &mut O) -> SessionReport
    where
        S: DuplexStream,
        I: InputSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        info!("Session started");
        let cancel = CancellationToken::new();
        let local_name = self.config.local_name.as_str();
        let (reader, writer) = stream.into_split();

        let read = read_loop(reader, output, local_name, cancel.clone());
        let write = write_loop(writer, input, local_name, cancel.clone());
        tokio::pin!(read);
        tokio::pin!(write);

        self.transition(SessionState::Active);

        // First to finish wins; the other is cancelled and awaited
        let (reader_summary, writer_summary, first_exit) = tokio::select! {
            reader_summary = &mut read => {
                self.transition(SessionState::Draining);
                cancel.cancel();
                let writer_summary = write.await;
                (reader_summary, writer_summary, true)
            }
            writer_summary = &mut write => {
                self.transition(SessionState::Draining);
                cancel.cancel();
                let reader_summary = read.await;
                (reader_summary, writer_summary, false)
            }
        };

        let (first, second) = if first_exit {
            (reader_summary.exit, writer_summary.exit)
        } else {
            (writer_summary.exit, reader_summary.exit)
        };
        let outcome = match (first, second) {
            (LoopExit::Finished(outcome), _) | (LoopExit::Cancelled, LoopExit::Finished(outcome)) => {
                outcome
            }
            (LoopExit::Cancelled, LoopExit::Cancelled) => {
                SessionOutcome::ConnectionLost("session cancelled".to_string())
            }
        };

        self.transition(SessionState::Closed);
        info!(
            sent = writer_summary.sent,
            received = reader_summary.received,
            "Session ended: {}",
            outcome
        );

        SessionReport {
            session_id: self.id,
            outcome,
            peer_name: reader_summary.peer_name,
            messages_sent: writer_summary.sent,
            messages_received: reader_summary.received,
        }
    }
}

// ----------------------------------------------------------------------------
// Reader / Writer Loops
// ----------------------------------------------------------------------------

async fn read_loop<R, O>(
    mut reader: R,
    output: &mut O,
    local_name: &str,
    cancel: CancellationToken,
) -> ReaderSummary
where
    R: FrameReader,
    O: OutputSink + ?Sized,
{
    let mut peer_name = None;
    let mut received = 0;

    let exit = loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break LoopExit::Cancelled,
            frame = reader.recv() => frame,
        };

        match frame {
            Ok(Some(message)) => {
                if message.sender().is_empty() {
                    warn!("Dropping message without a sender name");
                    continue;
                }
                if message.is_from(local_name) {
                    trace!("Suppressing echo of our own message");
                    continue;
                }
                if peer_name.is_none() {
                    info!("Peer identified as '{}'", message.sender());
                    peer_name = Some(message.sender().to_string());
                }
                received += 1;
                if let Err(e) = output.deliver(message).await {
                    warn!("Failed to display message: {}", e);
                    break LoopExit::Finished(SessionOutcome::ConnectionLost(e.to_string()));
                }
            }
            Ok(None) => {
                info!("Peer disconnected gracefully");
                break LoopExit::Finished(SessionOutcome::PeerClosed);
            }
            Err(e) => {
                warn!("Connection lost: {}", e);
                break LoopExit::Finished(SessionOutcome::ConnectionLost(e.to_string()));
            }
        }
    };

    cancel.cancel();
    ReaderSummary {
        exit,
        peer_name,
        received,
    }
}

async fn write_loop<W, I>(
    mut writer: W,
    input: &mut I,
    local_name: &str,
    cancel: CancellationToken,
) -> WriterSummary
where
    W: FrameWriter,
    I: InputSource + ?Sized,
{
    let mut sent = 0;

    let exit = loop {
        // Cancellation is checked before the input, so once the token fires
        // no further line is taken from the source
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break LoopExit::Cancelled,
            next = input.next_line() => next,
        };

        let body = match next {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!("Input exhausted, closing outbound stream");
                if let Err(e) = writer.close().await {
                    debug!("Failed to close outbound stream: {}", e);
                }
                break LoopExit::Finished(SessionOutcome::InputClosed);
            }
            Err(e) => {
                warn!("Failed to read input: {}", e);
                if let Err(e) = writer.close().await {
                    debug!("Failed to close outbound stream: {}", e);
                }
                break LoopExit::Finished(SessionOutcome::InputClosed);
            }
        };

        // A dequeued line is no longer in the source; finish writing it even
        // if the session is being cancelled
        let message = Message::new(local_name, body);
        match writer.send(&message).await {
            Ok(()) => sent += 1,
            Err(e) => {
                warn!("Error sending message: {}", e);
                break LoopExit::Finished(SessionOutcome::ConnectionLost(e.to_string()));
            }
        }
    };

    cancel.cancel();
    WriterSummary { exit, sent }
}
