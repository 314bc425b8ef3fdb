//! Connection Acceptor
//!
//! Accepts incoming connections and runs one duplex session per connection,
//! one peer at a time. Every session reads from the same outbound queue, so
//! lines typed while nobody is connected are delivered to the next peer.

use std::time::Duration;

use simplechat_core::{
    AcceptorConfig, DuplexSession, DuplexStream, Listener, OutboundQueue, OutputSink,
    SessionReport,
};
use tracing::{info, warn};

/// Pause after a failed `accept` before trying again
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Accept-side driver
pub struct ConnectionAcceptor {
    config: AcceptorConfig,
    queue: OutboundQueue,
    sessions: u64,
}

impl ConnectionAcceptor {
    pub fn new(config: AcceptorConfig, queue: OutboundQueue) -> Self {
        Self {
            config,
            queue,
            sessions: 0,
        }
    }

    pub fn config(&self) -> &AcceptorConfig {
        &self.config
    }

    /// The queue feeding every session's writer loop
    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    /// Number of sessions run so far
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Run exactly one session over an accepted stream.
    pub async fn handle_connection<S, O>(&mut self, stream: S, output: &mut O) -> SessionReport
    where
        S: DuplexStream,
        O: OutputSink + ?Sized,
    {
        self.sessions += 1;
        info!("Client connected from {}", stream.peer_label());

        let mut input = self.queue.consumer().await;
        let session = DuplexSession::new(self.config.session.clone());
        let report = session.run(stream, &mut input, output).await;

        match &report.peer_name {
            Some(peer) => info!("Client '{}' disconnected: {}", peer, report.outcome),
            None => info!("Client disconnected: {}", report.outcome),
        }
        if self.queue.pending() > 0 {
            info!(
                "{} message(s) queued for the next client",
                self.queue.pending()
            );
        }
        report
    }

    /// Accept and serve connections forever.
    pub async fn serve<L, O>(mut self, listener: L, mut output: O)
    where
        L: Listener,
        O: OutputSink,
    {
        info!(
            "Server '{}' running. Waiting for client to connect...",
            self.config.session.local_name
        );

        loop {
            match listener.accept().await {
                Ok(stream) => {
                    self.handle_connection(stream, &mut output).await;
                    info!("Waiting for client to connect...");
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_PAUSE).await;
                }
            }
        }
    }
}
