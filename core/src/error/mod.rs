#[allow(clippy::module_inception)]
pub mod error;
mod gateway;

pub use error::{CliError, MergeError};
pub use gateway::GatewayError;
