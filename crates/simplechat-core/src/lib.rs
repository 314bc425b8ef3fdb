//! SimpleChat Core
//!
//! This crate provides the building blocks of the SimpleChat duplex transport:
//! - `Message`: the unit exchanged between two named participants
//! - Wire framing and the `DuplexStream` transport abstraction (TCP included)
//! - `OutboundQueue`: the mailbox feeding accept-side sessions
//! - `DuplexSession`: one reader loop and one writer loop over a single stream
//!
//! The reconnecting supervisor and the connection acceptor live in
//! `simplechat-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod endpoints;
pub mod errors;
pub mod message;
pub mod queue;
pub mod session;
pub mod transport;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::{
    AcceptorConfig, SessionConfig, SupervisorConfig, DEFAULT_MAX_FRAME_LEN, DEFAULT_PORT,
    DEFAULT_RETRY_DELAY,
};
pub use endpoints::{
    ChannelSink, ConsoleInput, ConsoleOutput, InputSource, LinesInput, OutputSink,
};
pub use errors::{ChatError, ChatResult};
pub use message::Message;
pub use queue::{OutboundQueue, QueueConsumer};
pub use session::{DuplexSession, SessionOutcome, SessionReport, SessionState};
pub use transport::{
    Connector, DuplexStream, FrameReader, FrameWriter, FramedConnection, Listener, TcpChatListener,
    TcpConnector,
};
