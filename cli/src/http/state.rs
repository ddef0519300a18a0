//! HTTP服务器状态管理

use cacatua_core::api::{AppConfig, Services};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// 应用状态（在所有handlers间共享）
#[derive(Clone)]
pub struct AppState {
    pub session_id: String,
    pub services: Arc<Services>,
    pub config: Arc<AppConfig>,
    pub stats: Arc<ServerStats>,
    /// 置为 true 即开始关闭；进行中的日志收集将其视为取消信号。
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(session_id: String, services: Services, config: AppConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            session_id,
            services: Arc::new(services),
            config: Arc::new(config),
            stats: Arc::new(ServerStats::default()),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 触发关闭（幂等）
    pub fn trigger_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// 等待关闭标志置位；发送端被丢弃也视为关闭。
pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// 服务器统计信息（计数器无锁，按端点计数用一把小锁）
pub struct ServerStats {
    started_at: DateTime<Local>,
    requests_total: AtomicU64,
    errors_total: AtomicU64,
    by_endpoint: Mutex<BTreeMap<&'static str, u64>>,
}

impl Default for ServerStats {
    fn default() -> Self {
        Self {
            started_at: Local::now(),
            requests_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            by_endpoint: Mutex::new(BTreeMap::new()),
        }
    }
}

impl ServerStats {
    pub fn record_request(&self, endpoint: &'static str) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let mut by_endpoint = self.by_endpoint.lock().unwrap_or_else(|e| e.into_inner());
        *by_endpoint.entry(endpoint).or_default() += 1;
    }

    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    pub fn endpoint_count(&self, endpoint: &str) -> u64 {
        let by_endpoint = self.by_endpoint.lock().unwrap_or_else(|e| e.into_inner());
        by_endpoint.get(endpoint).copied().unwrap_or(0)
    }

    pub fn uptime_seconds(&self) -> f64 {
        (Local::now() - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
