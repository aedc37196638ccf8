//! Streaming Response Aggregator: turns an ordered fragment stream into incremental
//! observer callbacks and one assembled string.
//!
//! One aggregator per in-flight request. `run` consumes it, so at most one terminal
//! callback (`on_done` xor `on_error`) can ever fire. Dropping the `run` future cancels
//! everything; nothing is retried.

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::llm_client::LlmError;

/// Receives aggregation events in fragment-arrival order.
pub trait StreamObserver {
    /// Called once per fragment, with the fragment only (not the buffer). Empty fragments
    /// are delivered too.
    fn on_delta(&mut self, fragment: &str);

    /// Called once after the last fragment with the full text.
    fn on_done(&mut self, final_text: &str);

    /// Called once on a transport failure. Nothing follows it.
    fn on_error(&mut self, error: &LlmError);

    /// Whether the target of the callbacks has gone away.
    fn is_closed(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub enum AggregateOutcome {
    Completed(String),
    Failed(LlmError),
    /// The observer closed before the stream ended; no further callbacks were made.
    Abandoned,
}

#[derive(Debug, Default)]
pub struct StreamAggregator {
    buffer: String,
    fragments: usize,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains `stream` into `observer`.
    pub async fn run<S, O>(mut self, stream: S, observer: &mut O) -> AggregateOutcome
    where
        S: Stream<Item = Result<String, LlmError>>,
        O: StreamObserver + ?Sized,
    {
        let mut stream = std::pin::pin!(stream);

        loop {
            let next = stream.next().await;

            if observer.is_closed() {
                debug!(
                    "Observer closed after {} fragments; abandoning stream",
                    self.fragments
                );
                return AggregateOutcome::Abandoned;
            }

            match next {
                Some(Ok(fragment)) => {
                    self.buffer.push_str(&fragment);
                    self.fragments += 1;
                    observer.on_delta(&fragment);
                }
                Some(Err(error)) => {
                    warn!("Stream failed after {} fragments: {error}", self.fragments);
                    observer.on_error(&error);
                    return AggregateOutcome::Failed(error);
                }
                None => {
                    debug!(
                        "Stream complete: {} fragments, {} bytes",
                        self.fragments,
                        self.buffer.len()
                    );
                    observer.on_done(&self.buffer);
                    return AggregateOutcome::Completed(self.buffer);
                }
            }
        }
    }
}
