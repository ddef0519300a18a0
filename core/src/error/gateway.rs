use thiserror::Error;

use super::error::MergeError;
use crate::logs::{CancelReason, MergedLogs};

/// Request-level failures of the gateway, each with a fixed HTTP status.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Malformed JSON body.
    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    InvalidRequest(String),

    /// Sparse and typed options disagree; a server-side defect.
    #[error(transparent)]
    SchemaMismatch(#[from] MergeError),

    #[error("container not found!")]
    NotFound { container: String },

    /// The runtime failed (list, exists, or the log producer).
    #[error("{0}")]
    Backend(String),

    /// Log collection stopped before the producer finished.
    #[error("log stream cancelled: {reason}")]
    Cancelled {
        reason: CancelReason,
        partial: MergedLogs,
    },
}

impl GatewayError {
    pub fn backend(err: anyhow::Error) -> Self {
        Self::Backend(format!("{err:#}"))
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Decode(_) | Self::InvalidRequest(_) => 400,
            Self::NotFound { .. } => 404,
            Self::SchemaMismatch(_) | Self::Backend(_) => 500,
            Self::Cancelled { .. } => 504,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::InvalidRequest(_) => "invalid_request",
            Self::SchemaMismatch(_) => "schema_mismatch",
            Self::NotFound { .. } => "not_found",
            Self::Backend(_) => "backend",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
