use crate::config::AppConfig;
use crate::error::CliError;
use crate::runtime::ContainerRuntime;
use std::sync::Arc;

/// Long-lived handles shared by every request.
#[derive(Clone)]
pub struct Services {
    pub runtime: Arc<dyn ContainerRuntime>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    /// Acquire the backend connection described by `cfg.backend`.
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn with_config(&self, cfg: AppConfig) -> Self {
        Self {
            cfg,
            services_factory: self.services_factory.clone(),
        }
    }

    pub async fn build_services(&self) -> Result<Services, CliError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(CliError::Config(
                "services_factory missing (cannot build backend runtime)".into(),
            ));
        };
        factory.build_services(&self.cfg).await
    }
}
