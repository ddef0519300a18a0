use serde::{Deserialize, Serialize};

use crate::logs::FoldPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "cacatua_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Hard upper bound for any request, enforced by the timeout layer.
    /// Keep it above `logs.stream_timeout_ms` so log collection can report
    /// its partial result before the layer cuts the request. 0 disables it.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum BackendConfig {
    #[serde(rename = "podman")]
    Podman(PodmanConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Podman(PodmanConfig::default())
    }
}

impl BackendConfig {
    pub fn base_url_mut(&mut self) -> &mut String {
        let BackendConfig::Podman(ref mut podman) = self;
        &mut podman.base_url
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodmanConfig {
    /// `unix:///path/to/podman.sock` or `http://host:port` for a service
    /// started with `podman system service tcp:<addr>`.
    #[serde(default = "default_podman_url")]
    pub base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout for list/exists/ping. Log streams are not bounded
    /// by this; they use `logs.stream_timeout_ms`.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Refuse to start the gateway when the first ping fails.
    #[serde(default)]
    pub require_healthy_on_start: bool,
}

/// The rootless service socket: `$XDG_RUNTIME_DIR/podman/podman.sock`,
/// with `/run/user/<uid>` standing in when the variable is unset.
#[cfg(unix)]
fn default_podman_url() -> String {
    let runtime_dir = dirs::runtime_dir().unwrap_or_else(|| {
        // SAFETY: getuid has no preconditions and cannot fail.
        let uid = unsafe { libc::getuid() };
        std::path::PathBuf::from(format!("/run/user/{uid}"))
    });
    format!("unix://{}", runtime_dir.join("podman/podman.sock").display())
}

#[cfg(not(unix))]
fn default_podman_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

fn default_api_version() -> String {
    "v5.0.0".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for PodmanConfig {
    fn default() -> Self {
        Self {
            base_url: default_podman_url(),
            api_version: default_api_version(),
            timeout_ms: default_timeout_ms(),
            connect_retries: default_connect_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            require_healthy_on_start: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Log collection is cancelled after this long and answered with the
    /// partial buffers. 0 disables the deadline.
    #[serde(default = "default_stream_timeout_ms")]
    pub stream_timeout_ms: u64,

    #[serde(default)]
    pub fold_policy: FoldPolicy,
}

fn default_stream_timeout_ms() -> u64 {
    30_000
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            stream_timeout_ms: default_stream_timeout_ms(),
            fold_policy: FoldPolicy::default(),
        }
    }
}
