//! HTTP服务器生命周期管理

use super::{
    middleware::with_middleware,
    routes::create_router,
    state::wait_for_shutdown,
    AppState,
};
use crate::commands::cli::ServeArgs;
use axum::Router;
use cacatua_core::api::{AppContext, CliError};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};
use uuid::Uuid;

/// HTTP服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 处理 serve 命令
pub async fn handle_serve(args: ServeArgs, ctx: &AppContext) -> Result<(), CliError> {
    // 合并配置：CLI 参数优先
    let mut cfg = ctx.cfg().clone();
    args.apply(&mut cfg);
    let ctx = ctx.with_config(cfg);

    // 构建 Services（连接后端）
    let services = ctx.build_services().await?;

    let session_id = Uuid::new_v4().to_string();
    let config = ServerConfig {
        host: ctx.cfg().http_server.host.clone(),
        port: ctx.cfg().http_server.port,
    };
    let state = AppState::new(session_id.clone(), services, ctx.cfg().clone());

    start_server_with_config(session_id, config, state)
        .await
        .map_err(|e| CliError::Server(e.to_string()))
}

/// 路由 + 中间件
pub fn build_app(state: AppState) -> Router {
    let request_timeout_ms = state.config.http_server.request_timeout_ms;
    with_middleware(create_router(state), request_timeout_ms)
}

/// 使用自定义配置启动HTTP服务器
pub async fn start_server_with_config(
    session_id: String,
    config: ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        "Starting HTTP server on {}:{} (session: {})",
        config.host, config.port, session_id
    );

    let app = build_app(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    let shutdown_rx = state.shutdown_rx();
    let shutdown_state = state.clone();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = wait_for_shutdown(shutdown_rx) => {
                    info!("Received shutdown signal");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }

            // 通知进行中的日志收集提前返回部分结果
            shutdown_state.trigger_shutdown();
            info!("Starting graceful shutdown...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// 等待 SIGTERM 信号（Unix系统）
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {e}");
            std::future::pending::<()>().await
        }
    }
}

/// Windows 系统不支持 SIGTERM，使用空操作
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
