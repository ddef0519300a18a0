use std::{fmt, time::Duration};

use bytes::Bytes;
use cacatua_core::api::{ListOptions, LogOptions, PodmanConfig};
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::{StatusCode, Url};
use serde_json::Value;

#[cfg(unix)]
use super::socket;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Coarse failure class of a libpod call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodmanHttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl PodmanHttpErrorKind {
    fn of(err: &reqwest::Error) -> Self {
        [
            (err.is_timeout(), Self::Timeout),
            (err.is_connect(), Self::Connect),
            (err.is_request(), Self::Request),
            (err.is_body(), Self::Body),
            (err.is_decode(), Self::Decode),
        ]
        .into_iter()
        .find_map(|(hit, kind)| hit.then_some(kind))
        .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for PodmanHttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("podman {kind} error{}: {message} ({url})", status_suffix(.status))]
pub struct PodmanHttpError {
    kind: PodmanHttpErrorKind,
    status: Option<u16>,
    url: String,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" {code}")).unwrap_or_default()
}

impl PodmanHttpError {
    pub fn kind(&self) -> PodmanHttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    fn transport(err: reqwest::Error, url: impl Into<String>) -> Self {
        Self {
            kind: PodmanHttpErrorKind::of(&err),
            status: err.status().map(|s| s.as_u16()),
            url: url.into(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    fn bad_status(code: u16, url: String, body: &str) -> Self {
        Self {
            kind: PodmanHttpErrorKind::Status,
            status: Some(code),
            url,
            message: libpod_message(body),
            source: None,
        }
    }

    fn undecodable(code: u16, url: String, err: serde_json::Error, body: &str) -> Self {
        Self {
            kind: PodmanHttpErrorKind::Decode,
            status: Some(code),
            url,
            message: format!("unexpected response body: {}", preview_body(body)),
            source: Some(Box::new(err)),
        }
    }

    pub(super) fn socket(
        kind: PodmanHttpErrorKind,
        url: String,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            status: None,
            url,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    #[cfg_attr(not(unix), allow(dead_code))]
    fn timed_out(url: String, after: Duration) -> Self {
        Self {
            kind: PodmanHttpErrorKind::Timeout,
            status: None,
            url,
            message: format!("no response within {}ms", after.as_millis()),
            source: None,
        }
    }

    fn request(url: String, message: String) -> Self {
        Self {
            kind: PodmanHttpErrorKind::Request,
            status: None,
            url,
            message,
            source: None,
        }
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// libpod error bodies look like `{"cause": .., "message": .., "response": ..}`.
fn libpod_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| preview_body(body))
}

/// Response head plus a body that is still on the wire.
pub struct PodmanResponse {
    status: StatusCode,
    url: String,
    body: ResponseBody,
}

enum ResponseBody {
    Tcp(reqwest::Response),
    #[cfg(unix)]
    Socket(hyper::body::Incoming),
}

impl PodmanResponse {
    fn tcp(resp: reqwest::Response) -> Self {
        Self {
            status: resp.status(),
            url: resp.url().to_string(),
            body: ResponseBody::Tcp(resp),
        }
    }

    #[cfg(unix)]
    pub(super) fn from_socket(status: StatusCode, url: String, body: hyper::body::Incoming) -> Self {
        Self {
            status,
            url,
            body: ResponseBody::Socket(body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub async fn text(self) -> Result<String, PodmanHttpError> {
        match self.body {
            ResponseBody::Tcp(resp) => resp
                .text()
                .await
                .map_err(|err| PodmanHttpError::transport(err, self.url)),
            #[cfg(unix)]
            ResponseBody::Socket(body) => socket::read_text(body, self.url).await,
        }
    }

    /// Body chunks as they arrive; the log frame decoder consumes this.
    pub fn bytes_stream(self) -> BoxStream<'static, Result<Bytes, PodmanHttpError>> {
        let url = self.url;
        match self.body {
            ResponseBody::Tcp(resp) => resp
                .bytes_stream()
                .map_err(move |err| PodmanHttpError::transport(err, url.clone()))
                .boxed(),
            #[cfg(unix)]
            ResponseBody::Socket(body) => socket::data_stream(body, url),
        }
    }
}

async fn status_error(resp: PodmanResponse) -> PodmanHttpError {
    let code = resp.status().as_u16();
    let url = resp.url.clone();
    match resp.text().await {
        Ok(body) => PodmanHttpError::bad_status(code, url, &body),
        Err(err) => err,
    }
}

async fn parse_json_array(resp: PodmanResponse) -> anyhow::Result<Vec<Value>> {
    if !resp.status().is_success() {
        return Err(status_error(resp).await.into());
    }
    let code = resp.status().as_u16();
    let url = resp.url.clone();
    let body = resp.text().await?;

    // libpod answers `null` instead of `[]` when nothing matches.
    serde_json::from_str::<Option<Vec<Value>>>(&body)
        .map(Option::unwrap_or_default)
        .map_err(|err| PodmanHttpError::undecodable(code, url, err, &body).into())
}

#[derive(Clone)]
enum Endpoint {
    Tcp {
        http: reqwest::Client,
        // Log streams can stay open for as long as the container runs, so
        // they use a client without a total request timeout.
        stream_http: reqwest::Client,
    },
    #[cfg(unix)]
    Socket(std::path::PathBuf),
}

/// Requests over the socket carry this authority; only the path matters.
const SOCKET_ROOT: &str = "http://d";

#[cfg(unix)]
fn socket_endpoint(path: &str) -> anyhow::Result<Endpoint> {
    if !path.starts_with('/') {
        anyhow::bail!("podman socket path must be absolute: unix://{path}");
    }
    Ok(Endpoint::Socket(path.into()))
}

#[cfg(not(unix))]
fn socket_endpoint(path: &str) -> anyhow::Result<Endpoint> {
    anyhow::bail!("unix sockets are not available on this platform: unix://{path}")
}

/// Thin client for the libpod REST API served by `podman system service`,
/// over its unix socket or over TCP.
#[derive(Clone)]
pub struct PodmanHttpClient {
    endpoint: Endpoint,
    base: Url,
    #[cfg_attr(not(unix), allow(dead_code))]
    timeout: Duration,
    connect_retries: u32,
    retry_backoff: Duration,
}

impl PodmanHttpClient {
    pub fn new(cfg: &PodmanConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(cfg.timeout_ms);
        let (endpoint, root) = match cfg.base_url.strip_prefix("unix://") {
            Some(path) => (socket_endpoint(path)?, SOCKET_ROOT),
            None => {
                let http = reqwest::Client::builder()
                    .timeout(timeout)
                    .connect_timeout(timeout)
                    .build()?;
                let stream_http = reqwest::Client::builder()
                    .connect_timeout(timeout)
                    .build()?;
                (Endpoint::Tcp { http, stream_http }, cfg.base_url.as_str())
            }
        };
        let normalized = format!(
            "{}/{}/",
            root.trim_end_matches('/'),
            cfg.api_version.trim_matches('/')
        );
        let base = Url::parse(&normalized)
            .map_err(|e| anyhow::anyhow!("invalid podman base_url {}: {e}", cfg.base_url))?;
        Ok(Self {
            endpoint,
            base,
            timeout,
            connect_retries: cfg.connect_retries,
            retry_backoff: Duration::from_millis(cfg.retry_backoff_ms),
        })
    }

    /// `<base>/libpod/<segments...>`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, PodmanHttpError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PodmanHttpError::request(
                    self.base.to_string(),
                    "base url cannot carry a path".to_string(),
                )
            })?
            .pop_if_empty()
            .push("libpod")
            .extend(segments);
        Ok(url)
    }

    /// GET with a bounded retry on connection failures. Anything past the
    /// connect phase is returned to the caller as-is. `bounded` requests are
    /// cut off after the configured timeout; log streams are not.
    async fn get(
        &self,
        mut url: Url,
        query: &[(&str, String)],
        bounded: bool,
    ) -> Result<PodmanResponse, PodmanHttpError> {
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        let mut attempt = 0u32;
        loop {
            match self.send(&url, bounded).await {
                Err(err)
                    if err.kind() == PodmanHttpErrorKind::Connect
                        && attempt < self.connect_retries =>
                {
                    attempt += 1;
                    tracing::warn!(
                        target: "cacatua.podman",
                        url = %url,
                        attempt = attempt,
                        error = %err,
                        "podman connect failed, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                res => return res,
            }
        }
    }

    async fn send(&self, url: &Url, bounded: bool) -> Result<PodmanResponse, PodmanHttpError> {
        match &self.endpoint {
            Endpoint::Tcp { http, stream_http } => {
                let client = if bounded { http } else { stream_http };
                client
                    .get(url.clone())
                    .send()
                    .await
                    .map(PodmanResponse::tcp)
                    .map_err(|err| PodmanHttpError::transport(err, url.to_string()))
            }
            #[cfg(unix)]
            Endpoint::Socket(path) => {
                let request = socket::get(path, url);
                if !bounded {
                    return request.await;
                }
                tokio::time::timeout(self.timeout, request)
                    .await
                    .map_err(|_| PodmanHttpError::timed_out(url.to_string(), self.timeout))?
            }
        }
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let url = self.url(&["_ping"])?;
        let resp = self.get(url, &[], true).await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await.into());
        }
        Ok(())
    }

    pub async fn list_containers(&self, opts: &ListOptions) -> anyhow::Result<Vec<Value>> {
        let url = self.url(&["containers", "json"])?;
        let mut query = vec![
            ("all", opts.all.to_string()),
            ("external", opts.external.to_string()),
            ("namespace", opts.namespace.to_string()),
            ("size", opts.size.to_string()),
            ("sync", opts.sync.to_string()),
        ];
        if opts.last != 0 {
            query.push(("last", opts.last.to_string()));
        }
        if !opts.filters.is_empty() {
            query.push(("filters", serde_json::to_string(&opts.filters)?));
        }
        tracing::debug!(
            target: "cacatua.podman",
            stage = "podman.list.in",
            url = %url,
            filters = opts.filters.len()
        );
        let resp = self.get(url, &query, true).await?;
        let items = parse_json_array(resp).await?;
        tracing::debug!(target: "cacatua.podman", stage = "podman.list.out", count = items.len());
        Ok(items)
    }

    pub async fn container_exists(&self, name_or_id: &str) -> anyhow::Result<bool> {
        let url = self.url(&["containers", name_or_id, "exists"])?;
        let resp = self.get(url, &[], true).await?;
        match resp.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(resp).await.into()),
        }
    }

    /// Open the log stream. The body is libpod's multiplexed frame format.
    pub async fn logs(&self, name_or_id: &str, opts: &LogOptions) -> anyhow::Result<PodmanResponse> {
        let url = self.url(&["containers", name_or_id, "logs"])?;
        let selection = opts.selection();
        let mut query = vec![
            ("follow", opts.follow.to_string()),
            ("stdout", selection.stdout.to_string()),
            ("stderr", selection.stderr.to_string()),
            ("timestamps", opts.timestamps.to_string()),
        ];
        for (key, value) in [("since", &opts.since), ("tail", &opts.tail), ("until", &opts.until)] {
            if let Some(v) = value {
                query.push((key, v.clone()));
            }
        }
        tracing::debug!(
            target: "cacatua.podman",
            stage = "podman.logs.in",
            url = %url,
            follow = opts.follow
        );
        let resp = self.get(url, &query, false).await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await.into());
        }
        Ok(resp)
    }
}
