//! Console producer for the accept side
//!
//! One producer runs for the whole process lifetime, independent of how many
//! sessions come and go. It only ever appends to the outbound queue.

use simplechat_core::{ConsoleInput, InputSource, OutboundQueue};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Copy lines from `input` into `queue` until input ends.
///
/// Returns the number of lines queued.
pub async fn pump_lines<I>(input: &mut I, queue: &OutboundQueue) -> usize
where
    I: InputSource + ?Sized,
{
    let mut queued = 0;
    loop {
        match input.next_line().await {
            Ok(Some(line)) => {
                queue.push(line);
                queued += 1;
                debug!(pending = queue.pending(), "Queued console line");
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                break;
            }
        }
    }
    queued
}

/// Start the standing stdin producer.
///
/// The queue stays open after stdin closes, so connected peers keep their
/// sessions and anything already queued is still delivered.
pub fn spawn_console_producer(queue: OutboundQueue) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut input = ConsoleInput::stdin();
        let queued = pump_lines(&mut input, &queue).await;
        info!("Console input closed after {} line(s)", queued);
    })
}
