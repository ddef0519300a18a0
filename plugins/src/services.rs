//! ServicesFactory 实现：按配置构建容器运行时后端，供 CLI 与 HTTP 服务复用。
use async_trait::async_trait;
use cacatua_core::api::{AppConfig, CliError, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError> {
        let runtime = factory::build_runtime(&cfg.backend)
            .await
            .map_err(|e| CliError::Backend(format!("{e:#}")))?;
        Ok(Services { runtime })
    }
}
