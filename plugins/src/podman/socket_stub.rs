//! Stand-in libpod service on a unix socket: answers one canned reply per
//! connection and records the request lines it saw.

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

pub struct SocketStub {
    pub url: String,
    seen: JoinHandle<Vec<String>>,
    _dir: TempDir,
}

impl SocketStub {
    pub fn serve(replies: Vec<(&'static str, Vec<u8>)>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("podman.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let seen = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in replies {
                let (mut conn, _) = listener.accept().await.unwrap();
                seen.push(request_line(&mut conn).await);
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                conn.write_all(head.as_bytes()).await.unwrap();
                let _ = conn.write_all(&body).await;
                let _ = conn.shutdown().await;
            }
            seen
        });
        Self {
            url: format!("unix://{}", path.display()),
            seen,
            _dir: dir,
        }
    }

    /// Request lines in arrival order, once every reply has gone out.
    pub async fn requests(self) -> Vec<String> {
        self.seen.await.unwrap()
    }
}

async fn request_line(conn: &mut UnixStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = conn.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}
