mod frames;
mod http_client;
mod runtime;
#[cfg(unix)]
mod socket;
#[cfg(all(test, unix))]
mod socket_stub;

pub use frames::{demux, Frame, FrameDecoder};
pub use http_client::{PodmanHttpClient, PodmanHttpError, PodmanHttpErrorKind, PodmanResponse};
pub use runtime::PodmanRuntime;
