//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `cacatua_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, BackendConfig, HttpServerConfig, LoggingConfig,
    LogsConfig, PodmanConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{CliError, GatewayError, MergeError};
pub use crate::logs::{
    CancelReason, FoldPolicy, LogOutcome, LogSession, LogSinks, MergedLogs, Origin,
    OriginSelection, SinksClosed,
};
pub use crate::merge::{merge, Overlay};
pub use crate::options::{ListOptions, ListOptionsJson, LogOptions, LogOptionsJson};
pub use crate::runtime::ContainerRuntime;
