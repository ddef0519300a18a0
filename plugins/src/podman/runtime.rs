use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use cacatua_core::api::{ContainerRuntime, ListOptions, LogOptions, LogSinks, PodmanConfig};

use super::frames::{demux, Frame};
use super::http_client::PodmanHttpClient;

pub struct PodmanRuntime {
    client: PodmanHttpClient,
}

impl PodmanRuntime {
    pub fn new(cfg: &PodmanConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: PodmanHttpClient::new(cfg)?,
        })
    }
}

#[async_trait]
impl ContainerRuntime for PodmanRuntime {
    fn name(&self) -> &str {
        "podman"
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.client.ping().await
    }

    async fn list_containers(&self, opts: ListOptions) -> anyhow::Result<Vec<Value>> {
        self.client.list_containers(&opts).await
    }

    async fn container_exists(&self, name_or_id: &str) -> anyhow::Result<bool> {
        self.client.container_exists(name_or_id).await
    }

    async fn stream_logs(
        &self,
        name_or_id: &str,
        opts: LogOptions,
        mut sinks: LogSinks,
    ) -> anyhow::Result<()> {
        let resp = self.client.logs(name_or_id, &opts).await?;
        let frames = demux(resp.bytes_stream());
        futures::pin_mut!(frames);

        let mut emitted = 0u64;
        while let Some(frame) = frames.next().await {
            match frame? {
                Frame::Line { origin, payload } => {
                    if sinks.emit(origin, payload.to_vec()).is_err() {
                        // Consumer is gone; dropping the response closes the
                        // connection to the service.
                        tracing::debug!(
                            target: "cacatua.podman",
                            stage = "podman.logs.abandoned",
                            container = %name_or_id,
                            emitted = emitted
                        );
                        return Ok(());
                    }
                    emitted += 1;
                }
                Frame::ServerError(msg) => {
                    anyhow::bail!("podman log stream for {name_or_id} failed: {msg}");
                }
                Frame::Unknown { fd, payload } => {
                    tracing::warn!(
                        target: "cacatua.podman",
                        fd = fd,
                        bytes = payload.len(),
                        "skipping log frame with unknown stream id"
                    );
                }
            }
        }

        tracing::debug!(
            target: "cacatua.podman",
            stage = "podman.logs.out",
            container = %name_or_id,
            emitted = emitted
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacatua_core::api::{FoldPolicy, LogOutcome, LogSession};
    use mockito::{Matcher, Server};

    fn frame(fd: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![fd, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn runtime_for(url: String) -> std::sync::Arc<PodmanRuntime> {
        let cfg = PodmanConfig {
            base_url: url,
            timeout_ms: 1_000,
            connect_retries: 0,
            ..PodmanConfig::default()
        };
        std::sync::Arc::new(PodmanRuntime::new(&cfg).unwrap())
    }

    async fn collect(runtime: std::sync::Arc<PodmanRuntime>, opts: LogOptions) -> LogOutcome {
        let selection = opts.selection();
        LogSession::spawn(selection, move |sinks| async move {
            runtime.stream_logs("web", opts, sinks).await
        })
        .collect(FoldPolicy::Fold, std::future::pending())
        .await
    }

    #[tokio::test]
    async fn stream_logs_folds_stderr_when_both_requested() {
        let mut wire = frame(1, b"out-1\n");
        wire.extend(frame(2, b"err-1\n"));
        wire.extend(frame(1, b"out-2\n"));

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v5.0.0/libpod/containers/web/logs")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("stdout".into(), "true".into()),
                Matcher::UrlEncoded("stderr".into(), "true".into()),
                Matcher::UrlEncoded("tail".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(wire)
            .create_async()
            .await;

        let opts = LogOptions {
            stdout: true,
            stderr: true,
            tail: Some("10".into()),
            ..LogOptions::default()
        };
        let LogOutcome::Complete(merged) = collect(runtime_for(server.url()), opts).await else {
            panic!("expected complete");
        };

        let out = String::from_utf8(hex_decode(&merged.stdout)).unwrap();
        assert!(merged.stderr.is_empty());
        assert!(out.find("out-1").unwrap() < out.find("out-2").unwrap());
        assert!(out.contains("err-1"));
    }

    #[tokio::test]
    async fn server_error_frame_fails_the_producer() {
        let mut wire = frame(1, b"before\n");
        wire.extend(frame(3, b"container exited unexpectedly"));

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v5.0.0/libpod/containers/web/logs")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(wire)
            .create_async()
            .await;

        match collect(runtime_for(server.url()), LogOptions::default()).await {
            LogOutcome::Failed { partial, error } => {
                assert_eq!(hex_decode(&partial.stdout), b"before\n".to_vec());
                assert!(error.contains("container exited unexpectedly"));
            }
            other => panic!("expected failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn logs_status_error_fails_the_producer() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v5.0.0/libpod/containers/web/logs")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("no such container")
            .create_async()
            .await;

        assert!(matches!(
            collect(runtime_for(server.url()), LogOptions::default()).await,
            LogOutcome::Failed { .. }
        ));
    }

    fn hex_decode(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stream_logs_reads_frames_over_unix_socket() {
        let mut wire = frame(1, b"out-1\n");
        wire.extend(frame(2, b"err-1\n"));
        let stub = crate::podman::socket_stub::SocketStub::serve(vec![("200 OK", wire)]);

        let opts = LogOptions {
            stdout: true,
            stderr: true,
            ..LogOptions::default()
        };
        let LogOutcome::Complete(merged) = collect(runtime_for(stub.url.clone()), opts).await else {
            panic!("expected complete");
        };
        let out = String::from_utf8(hex_decode(&merged.stdout)).unwrap();
        assert!(out.contains("out-1") && out.contains("err-1"));
        assert!(merged.stderr.is_empty());

        let seen = stub.requests().await;
        assert!(seen[0].starts_with("GET /v5.0.0/libpod/containers/web/logs?"));
        assert!(seen[0].contains("stderr=true"));
    }
}
