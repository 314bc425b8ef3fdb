//! Outbound message queue
//!
//! The accept side reads console lines on one standing producer task and hands
//! them to whichever session is currently active. Lines typed while no session
//! is running stay queued and are delivered, in order, to the next session.
//!
//! The queue is unbounded. Exactly one consumer may hold the receiving end at a
//! time; a new session waits for the previous one to release it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, OwnedMutexGuard};

use crate::endpoints::InputSource;
use crate::errors::ChatResult;

// ----------------------------------------------------------------------------
// Outbound Queue
// ----------------------------------------------------------------------------

/// Unbounded FIFO of pending outbound message bodies
///
/// Cloning yields another handle to the same queue.
#[derive(Debug, Clone)]
pub struct OutboundQueue {
    sender: mpsc::UnboundedSender<String>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    pending: Arc<AtomicUsize>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append a body to the queue. Never blocks.
    pub fn push(&self, body: impl Into<String>) {
        // Count first so a fast consumer never observes an underflow
        self.pending.fetch_add(1, Ordering::SeqCst);
        // Every handle keeps the receiver alive, so the send cannot fail
        let _ = self.sender.send(body.into());
    }

    /// Number of bodies queued but not yet taken by a consumer
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Take exclusive ownership of the receiving end.
    ///
    /// Waits while another consumer is alive. Dropping the consumer hands the
    /// queue back with every untaken body still in place.
    pub async fn consumer(&self) -> QueueConsumer {
        QueueConsumer {
            receiver: self.receiver.clone().lock_owned().await,
            pending: self.pending.clone(),
        }
    }

    /// Non-blocking variant of [`OutboundQueue::consumer`]
    pub fn try_consumer(&self) -> Option<QueueConsumer> {
        self.receiver
            .clone()
            .try_lock_owned()
            .ok()
            .map(|receiver| QueueConsumer {
                receiver,
                pending: self.pending.clone(),
            })
    }
}

impl Default for OutboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Queue Consumer
// ----------------------------------------------------------------------------

/// Exclusive receiving end of an [`OutboundQueue`]
pub struct QueueConsumer {
    receiver: OwnedMutexGuard<mpsc::UnboundedReceiver<String>>,
    pending: Arc<AtomicUsize>,
}

impl QueueConsumer {
    /// Wait for the next body.
    ///
    /// Cancel safe: a body is only removed from the queue when this future
    /// completes.
    pub async fn next(&mut self) -> Option<String> {
        let body = self.receiver.recv().await?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(body)
    }
}

#[async_trait]
impl InputSource for QueueConsumer {
    async fn next_line(&mut self) -> ChatResult<Option<String>> {
        Ok(self.next().await)
    }
}
