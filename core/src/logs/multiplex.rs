use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;

use super::types::{
    CancelReason, FoldPolicy, LogSinks, MergedLogs, Origin, OriginSelection, TaggedLine,
};

/// Consumer half of a log session: one receiver per enabled origin.
#[derive(Debug)]
pub struct LogStreams {
    selection: OriginSelection,
    out: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
    err: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
}

/// Build the two per-origin channels. Disabled origins get no channel at
/// all: the producer's lines for them are dropped at the sink and the
/// multiplexer starts with that origin closed.
pub fn log_channel(selection: OriginSelection) -> (LogSinks, LogStreams) {
    let (out_tx, out_rx) = if selection.stdout {
        let (tx, rx) = mpsc::unbounded_channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };
    let (err_tx, err_rx) = if selection.stderr {
        let (tx, rx) = mpsc::unbounded_channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    (
        LogSinks::new(out_tx, err_tx),
        LogStreams {
            selection,
            out: out_rx,
            err: err_rx,
        },
    )
}

#[derive(Debug)]
pub enum Multiplexed {
    Drained(MergedLogs),
    Cancelled(MergedLogs, CancelReason),
}

#[derive(Debug)]
enum StreamEvent {
    Line(TaggedLine),
    Closed(Origin),
}

/// Open/closed flag per origin.
#[derive(Debug, Clone, Copy)]
struct StreamState {
    out_open: bool,
    err_open: bool,
}

impl StreamState {
    fn new(streams: &LogStreams) -> Self {
        Self {
            out_open: streams.out.is_some(),
            err_open: streams.err.is_some(),
        }
    }

    fn close(&mut self, origin: Origin) {
        match origin {
            Origin::Out => self.out_open = false,
            Origin::Err => self.err_open = false,
        }
    }

    fn all_closed(&self) -> bool {
        !self.out_open && !self.err_open
    }
}

fn origin_events(
    origin: Origin,
    rx: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
) -> BoxStream<'static, StreamEvent> {
    let Some(rx) = rx else {
        return stream::empty().boxed();
    };
    stream::unfold(rx, |mut rx| async move {
        let bytes = rx.recv().await?;
        Some((bytes, rx))
    })
    .map(move |bytes| StreamEvent::Line(TaggedLine { origin, bytes }))
    .chain(stream::once(async move { StreamEvent::Closed(origin) }))
    .boxed()
}

/// Drain both origins into hex buffers until each has closed, or until
/// `cancel` resolves.
///
/// Lines are taken from whichever origin has one ready; per-origin order is
/// kept, cross-origin order is arrival order.
pub async fn multiplex<C>(streams: LogStreams, policy: FoldPolicy, cancel: C) -> Multiplexed
where
    C: Future<Output = CancelReason>,
{
    let selection = streams.selection;
    let mut state = StreamState::new(&streams);
    let mut events = stream::select(
        origin_events(Origin::Out, streams.out),
        origin_events(Origin::Err, streams.err),
    );
    let mut merged = MergedLogs::default();
    let mut lines = 0u64;

    tokio::pin!(cancel);

    while !state.all_closed() {
        tokio::select! {
            reason = &mut cancel => {
                tracing::debug!(
                    target: "cacatua.logs",
                    stage = "multiplex.cancelled",
                    reason = %reason,
                    lines = lines
                );
                return Multiplexed::Cancelled(merged, reason);
            }
            event = events.next() => match event {
                Some(StreamEvent::Line(line)) => {
                    lines += 1;
                    merged.append(policy.destination(line.origin, selection), &line.bytes);
                }
                Some(StreamEvent::Closed(origin)) => {
                    tracing::debug!(target: "cacatua.logs", stage = "multiplex.closed", origin = %origin);
                    state.close(origin);
                }
                None => break,
            },
        }
    }

    tracing::debug!(target: "cacatua.logs", stage = "multiplex.drained", lines = lines);
    Multiplexed::Drained(merged)
}
