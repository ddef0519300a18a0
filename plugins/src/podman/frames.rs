//! Decoder for libpod's multiplexed log stream.
//!
//! Every frame is an 8-byte header `[fd, 0, 0, 0, len (u32 big-endian)]`
//! followed by `len` payload bytes. Frames are not aligned to HTTP chunks.

use bytes::{Buf, Bytes, BytesMut};
use cacatua_core::api::Origin;
use futures::{Stream, StreamExt};

const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line { origin: Origin, payload: Bytes },
    /// fd 3: the service failed mid-stream; payload is its message.
    ServerError(String),
    Unknown { fd: u8, payload: Bytes },
}

impl Frame {
    fn from_parts(fd: u8, payload: Bytes) -> Self {
        match fd {
            0 | 1 => Frame::Line {
                origin: Origin::Out,
                payload,
            },
            2 => Frame::Line {
                origin: Origin::Err,
                payload,
            },
            3 => Frame::ServerError(String::from_utf8_lossy(&payload).trim().to_string()),
            fd => Frame::Unknown { fd, payload },
        }
    }
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete frame, if the buffer holds one.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.buf.len() < HEADER_LEN {
            return None;
        }
        let fd = self.buf[0];
        let len = u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]) as usize;
        if self.buf.len() < HEADER_LEN + len {
            return None;
        }
        self.buf.advance(HEADER_LEN);
        let payload = self.buf.split_to(len).freeze();
        Some(Frame::from_parts(fd, payload))
    }

    /// Called at end of body. Leftover bytes mean the last frame was cut off.
    pub fn finish(&self) -> anyhow::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        anyhow::bail!(
            "log stream ended inside a frame ({} trailing bytes)",
            self.buf.len()
        )
    }
}

/// Turn a chunked HTTP body into a stream of frames.
pub fn demux<S, E>(body: S) -> impl Stream<Item = anyhow::Result<Frame>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::try_stream! {
        let mut decoder = FrameDecoder::default();
        let mut body = Box::pin(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(anyhow::Error::from)?;
            decoder.push(&chunk);
            while let Some(frame) = decoder.next_frame() {
                yield frame;
            }
        }
        decoder.finish()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frame(fd: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![fd, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn decodes_frames_split_across_chunks() {
        let mut wire = frame(1, b"hello\n");
        wire.extend(frame(2, b"oops\n"));

        let mut decoder = FrameDecoder::default();
        let mut frames = Vec::new();
        for chunk in wire.chunks(3) {
            decoder.push(chunk);
            while let Some(f) = decoder.next_frame() {
                frames.push(f);
            }
        }
        decoder.finish().unwrap();

        assert_eq!(
            frames,
            vec![
                Frame::Line {
                    origin: Origin::Out,
                    payload: Bytes::from_static(b"hello\n"),
                },
                Frame::Line {
                    origin: Origin::Err,
                    payload: Bytes::from_static(b"oops\n"),
                },
            ]
        );
    }

    #[test]
    fn empty_payload_and_server_error_frames() {
        let mut decoder = FrameDecoder::default();
        decoder.push(&frame(1, b""));
        decoder.push(&frame(3, b"container removed\n"));
        decoder.push(&frame(7, b"?"));

        assert_eq!(
            decoder.next_frame(),
            Some(Frame::Line {
                origin: Origin::Out,
                payload: Bytes::new(),
            })
        );
        assert_eq!(
            decoder.next_frame(),
            Some(Frame::ServerError("container removed".into()))
        );
        assert!(matches!(decoder.next_frame(), Some(Frame::Unknown { fd: 7, .. })));
        assert_eq!(decoder.next_frame(), None);
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let mut decoder = FrameDecoder::default();
        let wire = frame(1, b"cut short");
        decoder.push(&wire[..wire.len() - 2]);
        assert_eq!(decoder.next_frame(), None);
        assert!(decoder.finish().is_err());
    }

    #[tokio::test]
    async fn demux_yields_frames_then_reports_truncation() {
        let mut wire = frame(1, b"one");
        wire.extend_from_slice(&[2, 0, 0]);
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from(wire))];

        let results: Vec<_> = demux(futures::stream::iter(chunks)).collect().await;
        assert_eq!(results.len(), 2);
        assert!(matches!(
            &results[0],
            Ok(Frame::Line { origin: Origin::Out, payload }) if payload.as_ref() == b"one"
        ));
        assert!(results[1].is_err());
    }
}
