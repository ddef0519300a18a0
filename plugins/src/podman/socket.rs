//! HTTP/1 over the Podman service's unix socket.
//!
//! Each request opens its own connection. The connection task ends when the
//! response body has been read to the end or dropped, which is how an
//! abandoned log stream lets go of the service.

use std::path::Path;

use bytes::Bytes;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use reqwest::Url;
use tokio::net::UnixStream;

use super::http_client::{PodmanHttpError, PodmanHttpErrorKind, PodmanResponse};

/// libpod ignores the authority, but HTTP/1.1 needs a Host header.
const SOCKET_HOST: &str = "d";

pub(super) async fn get(socket: &Path, url: &Url) -> Result<PodmanResponse, PodmanHttpError> {
    use PodmanHttpErrorKind::{Connect, Request};

    let target = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };
    let label = format!("unix://{}{target}", socket.display());

    let stream = UnixStream::connect(socket)
        .await
        .map_err(|err| PodmanHttpError::socket(Connect, label.clone(), err))?;
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|err| PodmanHttpError::socket(Request, label.clone(), err))?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(target: "cacatua.podman", error = %e, "podman socket connection closed");
        }
    });

    let request = hyper::Request::get(target)
        .header(hyper::header::HOST, SOCKET_HOST)
        .body(Empty::<Bytes>::new())
        .map_err(|err| PodmanHttpError::socket(Request, label.clone(), err))?;
    let resp = sender
        .send_request(request)
        .await
        .map_err(|err| PodmanHttpError::socket(Request, label.clone(), err))?;

    Ok(PodmanResponse::from_socket(resp.status(), label, resp.into_body()))
}

pub(super) async fn read_text(body: Incoming, label: String) -> Result<String, PodmanHttpError> {
    let bytes = body
        .collect()
        .await
        .map_err(|err| PodmanHttpError::socket(PodmanHttpErrorKind::Body, label, err))?
        .to_bytes();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(super) fn data_stream(
    body: Incoming,
    label: String,
) -> BoxStream<'static, Result<Bytes, PodmanHttpError>> {
    body.into_data_stream()
        .map_err(move |err| PodmanHttpError::socket(PodmanHttpErrorKind::Body, label.clone(), err))
        .boxed()
}
