use std::future::Future;

use tokio::task::JoinHandle;

use super::multiplex::{log_channel, multiplex, LogStreams, Multiplexed};
use super::types::{CancelReason, FoldPolicy, LogOutcome, LogSinks, OriginSelection};

/// Aborts the producer task when dropped, so a consumer that stops reading
/// (cancelled, timed out, or its request future dropped) never leaves a
/// producer holding a backend connection.
struct ProducerGuard {
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl ProducerGuard {
    fn spawn<F>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(fut)),
        }
    }

    async fn join(mut self) -> anyhow::Result<()> {
        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let res = handle.await;
        self.handle = None;
        match res {
            Ok(res) => res,
            Err(e) => Err(anyhow::anyhow!("log producer task failed: {e}")),
        }
    }
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// One in-flight log collection: a spawned producer feeding two tagged
/// channels, and the consumer side waiting to multiplex them.
pub struct LogSession {
    streams: LogStreams,
    producer: ProducerGuard,
}

impl LogSession {
    /// Spawn `produce` with the sink half of a fresh channel pair.
    pub fn spawn<P, F>(selection: OriginSelection, produce: P) -> Self
    where
        P: FnOnce(LogSinks) -> F,
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let (sinks, streams) = log_channel(selection);
        let producer = ProducerGuard::spawn(produce(sinks));
        Self { streams, producer }
    }

    /// Multiplex until both origins close, then report how the producer
    /// ended. `cancel` is observed both while lines are flowing and while
    /// waiting for the producer to return.
    pub async fn collect<C>(self, policy: FoldPolicy, cancel: C) -> LogOutcome
    where
        C: Future<Output = CancelReason>,
    {
        let Self { streams, producer } = self;
        tokio::pin!(cancel);

        let merged = match multiplex(streams, policy, cancel.as_mut()).await {
            Multiplexed::Drained(merged) => merged,
            Multiplexed::Cancelled(partial, reason) => {
                drop(producer);
                return LogOutcome::Cancelled { partial, reason };
            }
        };

        tokio::select! {
            reason = cancel.as_mut() => LogOutcome::Cancelled { partial: merged, reason },
            res = producer.join() => match res {
                Ok(()) => LogOutcome::Complete(merged),
                Err(e) => {
                    tracing::warn!(
                        target: "cacatua.logs",
                        stage = "producer.failed",
                        partial_bytes = merged.byte_len(),
                        error = %format!("{e:#}")
                    );
                    LogOutcome::Failed {
                        partial: merged,
                        error: format!("{e:#}"),
                    }
                }
            },
        }
    }
}
