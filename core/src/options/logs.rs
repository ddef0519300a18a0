use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::logs::{Origin, OriginSelection};
use crate::merge::overlay_fields;

/// `POST /container/logs` body. `container_id` / `container_name` select the
/// container and are not forwarded to the runtime's log options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogOptionsJson {
    pub container_id: Option<String>,
    pub container_name: Option<String>,
    pub follow: Option<bool>,
    pub since: Option<String>,
    pub stderr: Option<bool>,
    pub stdout: Option<bool>,
    pub tail: Option<String>,
    pub timestamps: Option<bool>,
    pub until: Option<String>,
}

impl LogOptionsJson {
    /// The container to read from. Exactly one of id/name must be given.
    pub fn container_ref(&self) -> Result<&str, GatewayError> {
        match (non_empty(&self.container_id), non_empty(&self.container_name)) {
            (Some(id), None) => Ok(id),
            (None, Some(name)) => Ok(name),
            (None, None) => Err(GatewayError::InvalidRequest(
                "container id/name must be provided!".to_string(),
            )),
            (Some(_), Some(_)) => Err(GatewayError::InvalidRequest(
                "only one of container id/name may be provided!".to_string(),
            )),
        }
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

/// Log retrieval options as the runtime understands them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogOptions {
    pub follow: bool,
    pub since: Option<String>,
    pub stderr: bool,
    pub stdout: bool,
    /// Number of lines from the end, or "all".
    pub tail: Option<String>,
    pub timestamps: bool,
    pub until: Option<String>,
}

impl LogOptions {
    /// Origins to collect. The runtime requires at least one stream, so
    /// asking for neither means stdout.
    pub fn selection(&self) -> OriginSelection {
        if !self.stdout && !self.stderr {
            return OriginSelection::only(Origin::Out);
        }
        OriginSelection {
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}

overlay_fields!(LogOptionsJson => LogOptions {
    follow,
    since,
    stderr,
    stdout,
    tail,
    timestamps,
    until,
});
