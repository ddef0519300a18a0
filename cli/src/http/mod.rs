//! HTTP服务器模块 - 以 JSON/HTTP 暴露容器列表与日志接口

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod tests_support;

pub use models::*;
pub use server::*;
pub use state::*;
