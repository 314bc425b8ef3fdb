//! SimpleChat Runtime
//!
//! This crate drives `simplechat-core` sessions for the two process roles:
//! - `SessionSupervisor`: connect side, reconnects forever after a fixed delay
//! - `ConnectionAcceptor`: accept side, one session per incoming connection
//! - `console`: the standing console producer feeding the outbound queue

pub mod acceptor;
pub mod console;
pub mod supervisor;

pub use acceptor::ConnectionAcceptor;
pub use console::{pump_lines, spawn_console_producer};
pub use supervisor::{AttemptOutcome, SessionSupervisor, Sleeper, TokioSleeper};

// Re-export core types for convenience
pub use simplechat_core::{
    AcceptorConfig, ChatError, ChatResult, Message, OutboundQueue, SessionConfig, SessionOutcome,
    SessionReport, SupervisorConfig,
};
