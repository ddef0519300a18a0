//! Dual-stream log collection: a producer pushes stdout/stderr lines into two
//! tagged channels while the request task multiplexes them into hex buffers.

mod multiplex;
mod session;
mod types;

pub use multiplex::{log_channel, multiplex, LogStreams, Multiplexed};
pub use session::LogSession;
pub use types::{
    CancelReason, FoldPolicy, LogOutcome, LogSinks, MergedLogs, Origin, OriginSelection,
    SinksClosed, TaggedLine,
};
