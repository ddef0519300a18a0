//! HTTP路由handlers

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use cacatua_core::api::{
    merge, CancelReason, GatewayError, ListOptions, ListOptionsJson, LogOptions, LogOptionsJson,
    LogOutcome, LogSession, MergedLogs,
};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::http::{
    models::*,
    state::{wait_for_shutdown, AppState},
};

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/container/:cmd", any(container_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// /container/{cmd} - 按命令分发；仅 list/logs 有效，且必须为 POST
async fn container_handler(
    State(state): State<AppState>,
    Path(cmd): Path<String>,
    method: Method,
    body: Bytes,
) -> Response {
    let endpoint = match cmd.as_str() {
        "list" => "/container/list",
        "logs" => "/container/logs",
        _ => "/container/*",
    };
    state.stats.record_request(endpoint);

    let result = match cmd.as_str() {
        "list" | "logs" if method != Method::POST => Err(HttpServerError::MethodNotAllowed),
        "list" => list_handler(&state, &body)
            .await
            .map(|containers| Json(containers).into_response())
            .map_err(HttpServerError::from),
        "logs" => logs_handler(&state, &body)
            .await
            .map(|logs| Json(LogResponse::complete(logs)).into_response())
            .map_err(HttpServerError::from),
        _ => Ok(Json(DefaultResponse::command_not_found()).into_response()),
    };

    match result {
        Ok(resp) => resp,
        Err(err) => {
            state.stats.record_error();
            if let HttpServerError::Gateway(e) = &err {
                tracing::warn!(
                    target: "cacatua.http",
                    command = %cmd,
                    error_kind = e.kind(),
                    error = %e,
                    "container request failed"
                );
            }
            err.into_response()
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// POST /container/list - 列出容器
async fn list_handler(state: &AppState, body: &[u8]) -> Result<Vec<Value>, GatewayError> {
    let sparse: ListOptionsJson = decode(body)?;
    let opts = merge(&sparse, ListOptions::default())?;

    state
        .services
        .runtime
        .list_containers(opts)
        .await
        .map_err(GatewayError::backend)
}

/// POST /container/logs - 收集容器日志（十六进制编码）
async fn logs_handler(state: &AppState, body: &[u8]) -> Result<MergedLogs, GatewayError> {
    let sparse: LogOptionsJson = decode(body)?;
    // 标识符校验在任何后端调用之前
    let container = sparse.container_ref()?.to_string();
    let opts = merge(&sparse, LogOptions::default())?;

    let runtime = state.services.runtime.clone();
    let exists = runtime
        .container_exists(&container)
        .await
        .map_err(GatewayError::backend)?;
    if !exists {
        return Err(GatewayError::NotFound { container });
    }

    let selection = opts.selection();
    let producer_container = container.clone();
    let session = LogSession::spawn(selection, move |sinks| async move {
        runtime.stream_logs(&producer_container, opts, sinks).await
    });

    let cancel = cancel_signal(state.config.logs.stream_timeout_ms, state.shutdown_rx());
    match session.collect(state.config.logs.fold_policy, cancel).await {
        LogOutcome::Complete(merged) => Ok(merged),
        LogOutcome::Cancelled { partial, reason } => {
            tracing::info!(
                target: "cacatua.http",
                container = %container,
                reason = %reason,
                "log collection cancelled, returning partial output"
            );
            Err(GatewayError::Cancelled { reason, partial })
        }
        LogOutcome::Failed { error, .. } => Err(GatewayError::Backend(error)),
    }
}

/// 超时（0 表示不限）或服务器关闭时触发取消
async fn cancel_signal(timeout_ms: u64, shutdown: watch::Receiver<bool>) -> CancelReason {
    let deadline = async {
        if timeout_ms == 0 {
            std::future::pending::<()>().await
        } else {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await
        }
    };

    tokio::select! {
        _ = deadline => CancelReason::Timeout,
        _ = wait_for_shutdown(shutdown) => CancelReason::Shutdown,
    }
}

/// GET /health - 健康检查（后端不可达时返回 503）
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    state.stats.record_request("/health");

    let runtime = &state.services.runtime;
    let ping = runtime.ping().await;
    let (status, backend_error) = match &ping {
        Ok(()) => (StatusCode::OK, None),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, Some(format!("{e:#}"))),
    };

    let body = HealthResponse {
        status: if ping.is_ok() { "healthy" } else { "degraded" }.to_string(),
        session_id: state.session_id.clone(),
        backend: runtime.name().to_string(),
        backend_reachable: ping.is_ok(),
        backend_error,
        uptime_seconds: state.stats.uptime_seconds(),
        requests_handled: state.stats.requests_total(),
        errors_total: state.stats.errors_total(),
        timestamp: Local::now().to_rfc3339(),
    };

    (status, Json(body))
}
