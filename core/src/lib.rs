pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod logs;
pub mod merge;
pub mod options;
pub mod runtime;
