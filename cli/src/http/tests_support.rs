use async_trait::async_trait;
use cacatua_core::api::{ContainerRuntime, ListOptions, LogOptions, LogSinks};

/// Runtime with no containers that always answers ping.
pub struct NullRuntime;

#[async_trait]
impl ContainerRuntime for NullRuntime {
    fn name(&self) -> &str {
        "null"
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_containers(&self, _opts: ListOptions) -> anyhow::Result<Vec<serde_json::Value>> {
        Ok(vec![])
    }

    async fn container_exists(&self, _name_or_id: &str) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn stream_logs(
        &self,
        _name_or_id: &str,
        _opts: LogOptions,
        _sinks: LogSinks,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
