//! HTTP API数据模型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cacatua_core::api::{GatewayError, MergedLogs};
use serde::Serialize;

pub const COMMAND_NOT_FOUND: &str = "command not found!";
pub const METHOD_NOT_ALLOWED: &str = "method not allowed!";

// ============= Default =============

#[derive(Debug, Serialize)]
pub struct DefaultResponse {
    pub msg: String,
}

impl DefaultResponse {
    pub fn command_not_found() -> Self {
        Self {
            msg: COMMAND_NOT_FOUND.to_string(),
        }
    }
}

// ============= Logs =============

/// 日志响应：stdout/stderr 均为十六进制编码。
#[derive(Debug, Serialize)]
pub struct LogResponse {
    #[serde(flatten)]
    pub logs: MergedLogs,
    /// 仅在超时或关闭导致提前结束时出现。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
}

impl LogResponse {
    pub fn complete(logs: MergedLogs) -> Self {
        Self {
            logs,
            partial: None,
        }
    }

    pub fn partial(logs: MergedLogs) -> Self {
        Self {
            logs,
            partial: Some(true),
        }
    }
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub backend: String,
    pub backend_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_error: Option<String>,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors_total: u64,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    MethodNotAllowed,
    Gateway(GatewayError),
}

impl From<GatewayError> for HttpServerError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        match self {
            Self::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED).into_response()
            }
            // 超时/关闭：返回已收集的部分日志
            Self::Gateway(GatewayError::Cancelled { partial, .. }) => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(LogResponse::partial(partial)),
            )
                .into_response(),
            Self::Gateway(err) => {
                let status = StatusCode::from_u16(err.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacatua_core::api::{CancelReason, Origin};

    #[test]
    fn test_log_response_serialize() {
        let mut logs = MergedLogs::default();
        logs.append(Origin::Out, b"ok");
        let json = serde_json::to_value(LogResponse::complete(logs)).unwrap();
        assert_eq!(json, serde_json::json!({"stdout": "6f6b", "stderr": ""}));
    }

    #[test]
    fn test_default_response_serialize() {
        let json = serde_json::to_string(&DefaultResponse::command_not_found()).unwrap();
        assert_eq!(json, r#"{"msg":"command not found!"}"#);
    }

    #[test]
    fn test_error_statuses() {
        let resp = HttpServerError::MethodNotAllowed.into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        let resp = HttpServerError::from(GatewayError::NotFound {
            container: "web".into(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = HttpServerError::from(GatewayError::Cancelled {
            reason: CancelReason::Timeout,
            partial: MergedLogs::default(),
        })
        .into_response();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
