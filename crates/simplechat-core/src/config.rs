//! Configuration for sessions, the supervisor and the acceptor
//!
//! Every component receives its configuration explicitly at construction time.
//! There is no global or ambient state.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ChatError, ChatResult};

// ----------------------------------------------------------------------------
// Defaults
// ----------------------------------------------------------------------------

/// Well-known port used when none is given
pub const DEFAULT_PORT: u16 = 50051;

/// Fixed delay between reconnection attempts on the connecting side
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Largest frame payload accepted or produced (1 MiB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

// ----------------------------------------------------------------------------
// Session Configuration
// ----------------------------------------------------------------------------

/// Settings shared by every session a process runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name stamped on outbound messages and used for echo suppression
    pub local_name: String,
    /// Maximum frame payload size in bytes
    pub max_frame_len: usize,
}

impl SessionConfig {
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ChatResult<()> {
        if self.local_name.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "Participant name cannot be empty".to_string(),
            ));
        }
        if self.max_frame_len == 0 {
            return Err(ChatError::InvalidConfig(
                "Max frame length cannot be zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            local_name: "Server".to_string(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

// ----------------------------------------------------------------------------
// Supervisor Configuration
// ----------------------------------------------------------------------------

/// Connect-side configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub session: SessionConfig,
    /// `host:port` of the accepting peer
    pub target_address: String,
    /// Delay after every attempt, whatever its outcome
    pub retry_delay: Duration,
}

impl SupervisorConfig {
    pub fn new(session: SessionConfig, target_address: impl Into<String>) -> Self {
        Self {
            session,
            target_address: target_address.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn validate(&self) -> ChatResult<()> {
        self.session.validate()?;
        if self.target_address.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "Target address cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Acceptor Configuration
// ----------------------------------------------------------------------------

/// Accept-side configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptorConfig {
    pub session: SessionConfig,
    /// Address the listener binds to
    pub bind_address: String,
}

impl AcceptorConfig {
    pub fn new(session: SessionConfig, port: u16) -> Self {
        Self {
            session,
            bind_address: format!("0.0.0.0:{}", port),
        }
    }

    pub fn validate(&self) -> ChatResult<()> {
        self.session.validate()
    }
}
