//! HTTP中间件配置

use axum::{body::Body, http::Request, middleware::Next, response::Response, Router};
use std::time::{Duration, Instant};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// 挂载中间件：请求日志 -> 追踪 -> 整体超时（由内到外）
pub fn with_middleware(router: Router, request_timeout_ms: u64) -> Router {
    let router = router
        .layer(axum::middleware::from_fn(request_logger))
        .layer(create_trace_layer());
    match create_timeout_layer(request_timeout_ms) {
        Some(timeout) => router.layer(timeout),
        None => router,
    }
}

/// 超时后返回 408；0 表示不限时
fn create_timeout_layer(request_timeout_ms: u64) -> Option<TimeoutLayer> {
    (request_timeout_ms > 0).then(|| TimeoutLayer::new(Duration::from_millis(request_timeout_ms)))
}

fn create_trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// 请求日志中间件（记录方法、路径、状态码与耗时）
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    // 根据状态码选择日志级别
    if status.is_client_error() || status.is_server_error() {
        warn!(
            target: "cacatua.http",
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request failed"
        );
    } else {
        info!(
            target: "cacatua.http",
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}
