use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cacatua_core::api::{ContainerRuntime, ListOptions, LogOptions, LogSinks, Origin};
use serde_json::Value;

/// Runtime that replays a fixed script of tagged lines for one container.
#[derive(Default)]
pub struct ScriptedRuntime {
    pub container: &'static str,
    pub lines: Vec<(Origin, &'static str)>,
    pub block_at_end: bool,
    pub released: Arc<AtomicBool>,
}

/// Flips `released` when the producer future is dropped or finishes.
struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContainerRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_containers(&self, _opts: ListOptions) -> anyhow::Result<Vec<Value>> {
        Ok(vec![serde_json::json!({ "Names": [self.container] })])
    }

    async fn container_exists(&self, name_or_id: &str) -> anyhow::Result<bool> {
        Ok(name_or_id == self.container)
    }

    async fn stream_logs(
        &self,
        name_or_id: &str,
        _opts: LogOptions,
        mut sinks: LogSinks,
    ) -> anyhow::Result<()> {
        let _flag = ReleaseFlag(self.released.clone());
        anyhow::ensure!(name_or_id == self.container, "no such container: {name_or_id}");
        for (origin, line) in &self.lines {
            sinks.emit(*origin, *line)?;
        }
        if self.block_at_end {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

pub fn decode(hex_buf: &str) -> String {
    String::from_utf8(hex::decode(hex_buf).unwrap()).unwrap()
}
