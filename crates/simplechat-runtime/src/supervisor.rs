//! Session Supervisor
//!
//! Keeps a named client connected to a named server indefinitely:
//! connect, run one session to completion, release the connection, wait a
//! fixed delay, repeat. Every failure is handled the same way. There is no
//! backoff growth, no retry cap and no distinction between transient and
//! permanent errors.

use std::time::Duration;

use async_trait::async_trait;
use simplechat_core::{
    Connector, DuplexSession, DuplexStream, InputSource, OutputSink, SessionReport,
    SupervisorConfig,
};
use tracing::{info, warn};

// ----------------------------------------------------------------------------
// Sleeper
// ----------------------------------------------------------------------------

/// Waits out the delay between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ----------------------------------------------------------------------------
// Attempt Outcome
// ----------------------------------------------------------------------------

/// Result of one connect-and-run cycle
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    /// The connection could not be established; no session ran
    ConnectFailed(String),
    /// A session ran and has ended
    SessionEnded(SessionReport),
}

// ----------------------------------------------------------------------------
// Session Supervisor
// ----------------------------------------------------------------------------

/// Reconnecting driver for the connect side
pub struct SessionSupervisor<C, Z = TokioSleeper> {
    config: SupervisorConfig,
    connector: C,
    sleeper: Z,
    attempts: u64,
}

impl<C: Connector> SessionSupervisor<C, TokioSleeper> {
    pub fn new(config: SupervisorConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            sleeper: TokioSleeper,
            attempts: 0,
        }
    }
}

impl<C: Connector, Z: Sleeper> SessionSupervisor<C, Z> {
    /// Replace the sleeper used between attempts
    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> SessionSupervisor<C, Z2> {
        SessionSupervisor {
            config: self.config,
            connector: self.connector,
            sleeper,
            attempts: self.attempts,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Number of connection attempts made so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Connect once and run a session to completion.
    ///
    /// The connection is released before this returns.
    pub async fn attempt<I, O>(&mut self, input: &mut I, output: &mut O) -> AttemptOutcome
    where
        I: InputSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        self.attempts += 1;
        let address = self.config.target_address.as_str();
        info!(attempt = self.attempts, "Connecting to {}", address);

        let stream = match self.connector.connect(address).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Could not connect to {}: {}", address, e);
                return AttemptOutcome::ConnectFailed(e.to_string());
            }
        };

        info!("Connected to {}", stream.peer_label());
        let session = DuplexSession::new(self.config.session.clone());
        let report = session.run(stream, input, output).await;
        warn!("Disconnected from {}: {}", address, report.outcome);

        AttemptOutcome::SessionEnded(report)
    }

    /// Run forever. Only process termination (or dropping this future) stops it.
    pub async fn serve<I, O>(mut self, input: &mut I, output: &mut O)
    where
        I: InputSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        info!(
            "Starting client '{}', connecting to {}",
            self.config.session.local_name, self.config.target_address
        );

        loop {
            self.attempt(input, output).await;

            info!(
                "Reconnecting in {} seconds...",
                self.config.retry_delay.as_secs()
            );
            self.sleeper.sleep(self.config.retry_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplechat_core::{
        ChannelSink, ChatError, ChatResult, FramedConnection, SessionConfig, SessionOutcome,
    };
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    /// Connector whose every attempt is refused
    #[derive(Clone, Default)]
    struct RefusingConnector {
        calls: Arc<AtomicU64>,
    }

    #[async_trait]
    impl Connector for RefusingConnector {
        type Stream = FramedConnection<tokio::io::DuplexStream>;

        async fn connect(&self, address: &str) -> ChatResult<Self::Stream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ChatError::Connection {
                address: address.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    /// Connector handing out pipes whose remote end is closed immediately
    struct ClosedPeerConnector;

    #[async_trait]
    impl Connector for ClosedPeerConnector {
        type Stream = FramedConnection<tokio::io::DuplexStream>;

        async fn connect(&self, _address: &str) -> ChatResult<Self::Stream> {
            let (local, _remote) = tokio::io::duplex(1024);
            Ok(FramedConnection::new(local, "closed-peer"))
        }
    }

    /// Records every sleep and stalls forever once `limit` is reached
    struct CountingSleeper {
        slept: Arc<Mutex<Vec<Duration>>>,
        notify: mpsc::UnboundedSender<Duration>,
        limit: usize,
    }

    #[async_trait]
    impl Sleeper for CountingSleeper {
        async fn sleep(&self, duration: Duration) {
            let count = {
                let mut slept = self.slept.lock().unwrap();
                slept.push(duration);
                slept.len()
            };
            let _ = self.notify.send(duration);
            if count >= self.limit {
                futures::future::pending::<()>().await;
            }
        }
    }

    struct SilentInput;

    #[async_trait]
    impl InputSource for SilentInput {
        async fn next_line(&mut self) -> ChatResult<Option<String>> {
            futures::future::pending().await
        }
    }

    fn config(retry: Duration) -> SupervisorConfig {
        SupervisorConfig::new(SessionConfig::new("Tom"), "127.0.0.1:1").with_retry_delay(retry)
    }

    #[tokio::test]
    async fn test_connect_failure_reported() {
        let mut supervisor =
            SessionSupervisor::new(config(Duration::from_secs(60)), RefusingConnector::default());
        let (mut sink, _received) = ChannelSink::channel();

        let outcome = supervisor.attempt(&mut SilentInput, &mut sink).await;
        assert!(matches!(outcome, AttemptOutcome::ConnectFailed(_)));
        assert_eq!(supervisor.attempts(), 1);
    }

    #[tokio::test]
    async fn test_session_end_reported() {
        let mut supervisor =
            SessionSupervisor::new(config(Duration::from_secs(60)), ClosedPeerConnector);
        let (mut sink, _received) = ChannelSink::channel();

        let outcome = timeout(
            Duration::from_secs(2),
            supervisor.attempt(&mut SilentInput, &mut sink),
        )
        .await
        .unwrap();

        match outcome {
            AttemptOutcome::SessionEnded(report) => {
                assert_eq!(report.outcome, SessionOutcome::PeerClosed)
            }
            other => panic!("Unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_n_failures_produce_n_fixed_sleeps() {
        const FAILURES: usize = 5;
        let retry = Duration::from_secs(60);
        let connector = RefusingConnector::default();
        let calls = connector.calls.clone();
        let slept = Arc::new(Mutex::new(Vec::new()));
        let (notify, mut notifications) = mpsc::unbounded_channel();

        let supervisor = SessionSupervisor::new(config(retry), connector).with_sleeper(
            CountingSleeper {
                slept: slept.clone(),
                notify,
                limit: FAILURES,
            },
        );

        let handle = tokio::spawn(async move {
            let (mut sink, _received) = ChannelSink::channel();
            supervisor.serve(&mut SilentInput, &mut sink).await;
        });

        for _ in 0..FAILURES {
            let duration = timeout(Duration::from_secs(2), notifications.recv())
                .await
                .expect("supervisor should keep retrying")
                .unwrap();
            assert_eq!(duration, retry);
        }

        // Give a runaway loop the chance to show itself
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), FAILURES as u64);
        assert_eq!(slept.lock().unwrap().len(), FAILURES);
        assert!(slept.lock().unwrap().iter().all(|d| *d == retry));
        assert!(!handle.is_finished(), "supervisor must never stop on its own");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sleeps_after_every_session_too() {
        let retry = Duration::from_millis(5);
        let slept = Arc::new(Mutex::new(Vec::new()));
        let (notify, mut notifications) = mpsc::unbounded_channel();
        let supervisor = SessionSupervisor::new(config(retry), ClosedPeerConnector).with_sleeper(
            CountingSleeper {
                slept: slept.clone(),
                notify,
                limit: 2,
            },
        );

        let handle = tokio::spawn(async move {
            let (mut sink, _received) = ChannelSink::channel();
            supervisor.serve(&mut SilentInput, &mut sink).await;
        });

        for _ in 0..2 {
            timeout(Duration::from_secs(2), notifications.recv())
                .await
                .unwrap()
                .unwrap();
        }
        assert!(!handle.is_finished());
        handle.abort();
    }
}
