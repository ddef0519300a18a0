use std::sync::Arc;

use anyhow::Result;

use cacatua_core::api::{BackendConfig, ContainerRuntime};

use crate::podman::PodmanRuntime;

/// Build the runtime named by `backend.provider` and ping it once.
///
/// An unreachable backend only fails startup when the config asks for it;
/// otherwise requests surface the error when they reach the backend.
pub async fn build_runtime(backend: &BackendConfig) -> Result<Arc<dyn ContainerRuntime>> {
    match backend {
        BackendConfig::Podman(podman_cfg) => {
            let runtime = PodmanRuntime::new(podman_cfg)?;
            match runtime.ping().await {
                Ok(()) => tracing::info!(
                    target: "cacatua.podman",
                    base_url = %podman_cfg.base_url,
                    api_version = %podman_cfg.api_version,
                    "podman service reachable"
                ),
                Err(e) if podman_cfg.require_healthy_on_start => {
                    return Err(e.context(format!(
                        "podman service at {} is not reachable",
                        podman_cfg.base_url
                    )));
                }
                Err(e) => tracing::warn!(
                    target: "cacatua.podman",
                    base_url = %podman_cfg.base_url,
                    error = %format!("{e:#}"),
                    "podman service not reachable yet; continuing"
                ),
            }
            Ok(Arc::new(runtime))
        }
    }
}
