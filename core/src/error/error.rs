use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("server error: {0}")]
    Server(String),
}

/// A sparse field could not be assigned to its typed counterpart.
///
/// The whole merge is abandoned when this happens; callers never see a
/// half-merged target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("schema mismatch on field '{field}': cannot assign {from} to {to} without loss")]
    SchemaMismatch {
        field: &'static str,
        from: &'static str,
        to: &'static str,
    },
}
