pub mod cli;
pub mod ping;
