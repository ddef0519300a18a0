use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Which of the two log streams a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Out,
    Err,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Out => "stdout",
            Self::Err => "stderr",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    pub origin: Origin,
    pub bytes: Vec<u8>,
}

/// Origins the caller asked for. A disabled origin never reaches a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginSelection {
    pub stdout: bool,
    pub stderr: bool,
}

impl OriginSelection {
    pub fn both() -> Self {
        Self {
            stdout: true,
            stderr: true,
        }
    }

    pub fn only(origin: Origin) -> Self {
        Self {
            stdout: origin == Origin::Out,
            stderr: origin == Origin::Err,
        }
    }

    pub fn is_enabled(self, origin: Origin) -> bool {
        match origin {
            Origin::Out => self.stdout,
            Origin::Err => self.stderr,
        }
    }
}

/// Where lines land when both origins are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoldPolicy {
    /// stderr lines are appended to the stdout buffer; stderr stays empty.
    #[default]
    Fold,
    /// Each origin keeps its own buffer.
    Separate,
}

impl FoldPolicy {
    pub fn destination(self, origin: Origin, selection: OriginSelection) -> Origin {
        match self {
            Self::Fold if selection.stdout && selection.stderr => Origin::Out,
            _ => origin,
        }
    }
}

/// Hex-encoded, append-only result buffers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedLogs {
    pub stdout: String,
    pub stderr: String,
}

impl MergedLogs {
    pub fn append(&mut self, destination: Origin, bytes: &[u8]) {
        let buf = match destination {
            Origin::Out => &mut self.stdout,
            Origin::Err => &mut self.stderr,
        };
        buf.push_str(&hex::encode(bytes));
    }

    /// Decoded size of both buffers.
    pub fn byte_len(&self) -> usize {
        (self.stdout.len() + self.stderr.len()) / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Timeout,
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Shutdown => f.write_str("server shutting down"),
        }
    }
}

#[derive(Debug)]
pub enum LogOutcome {
    Complete(MergedLogs),
    Cancelled {
        partial: MergedLogs,
        reason: CancelReason,
    },
    Failed {
        partial: MergedLogs,
        error: String,
    },
}

/// Every enabled origin's receiver is gone; nobody will read further lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinksClosed;

impl fmt::Display for SinksClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("log consumer went away")
    }
}

impl std::error::Error for SinksClosed {}

/// Producer half of a log session: one unbounded sender per enabled origin.
///
/// Dropping the sinks (or calling [`LogSinks::close`]) is the close signal
/// the multiplexer waits for.
#[derive(Debug)]
pub struct LogSinks {
    out: Option<mpsc::UnboundedSender<Vec<u8>>>,
    err: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl LogSinks {
    pub(crate) fn new(
        out: Option<mpsc::UnboundedSender<Vec<u8>>>,
        err: Option<mpsc::UnboundedSender<Vec<u8>>>,
    ) -> Self {
        Self { out, err }
    }

    /// Push one line. Lines for a disabled or already-closed origin are
    /// discarded. Fails once no origin has a live receiver, which is the
    /// producer's cue to stop and release the backend.
    pub fn emit(&mut self, origin: Origin, bytes: impl Into<Vec<u8>>) -> Result<(), SinksClosed> {
        let slot = match origin {
            Origin::Out => &mut self.out,
            Origin::Err => &mut self.err,
        };
        if let Some(tx) = slot.as_ref() {
            if tx.send(bytes.into()).is_err() {
                *slot = None;
            }
        }
        if self.is_closed() {
            return Err(SinksClosed);
        }
        Ok(())
    }

    pub fn close(&mut self, origin: Origin) {
        match origin {
            Origin::Out => self.out = None,
            Origin::Err => self.err = None,
        }
    }

    pub fn is_closed(&self) -> bool {
        let gone = |tx: &Option<mpsc::UnboundedSender<Vec<u8>>>| {
            tx.as_ref().map(|tx| tx.is_closed()).unwrap_or(true)
        };
        gone(&self.out) && gone(&self.err)
    }
}
