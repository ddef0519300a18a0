use async_trait::async_trait;

use crate::logs::LogSinks;
use crate::options::{ListOptions, LogOptions};

/// The container runtime the gateway fronts.
///
/// One instance is built at startup and shared by every request; all
/// methods take `&self`.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap reachability check used at startup and by `/health`.
    async fn ping(&self) -> anyhow::Result<()>;

    /// Container records, passed through to the client untouched.
    async fn list_containers(&self, opts: ListOptions) -> anyhow::Result<Vec<serde_json::Value>>;

    async fn container_exists(&self, name_or_id: &str) -> anyhow::Result<bool>;

    /// Push log lines into `sinks` until the runtime ends the stream.
    ///
    /// Returning (or dropping `sinks`) closes both origins. Implementations
    /// stop early once [`LogSinks::emit`] reports that the consumer is gone.
    async fn stream_logs(
        &self,
        name_or_id: &str,
        opts: LogOptions,
        sinks: LogSinks,
    ) -> anyhow::Result<()>;
}
