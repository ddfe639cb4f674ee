use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::metrics::{MetricsSnapshot, MonitorMetrics};

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub sources: BTreeMap<String, SourceHealth>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceHealth {
    pub healthy: bool,
    pub last_checked: DateTime<Utc>,
    pub last_error: Option<String>,
}

#[derive(Clone)]
pub struct HealthChecker {
    start_time: std::time::Instant,
    sources: Arc<RwLock<BTreeMap<String, SourceHealth>>>,
    last_cycle_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    metrics: Arc<MonitorMetrics>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            sources: Arc::new(RwLock::new(BTreeMap::new())),
            last_cycle_at: Arc::new(RwLock::new(None)),
            metrics: Arc::new(MonitorMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &MonitorMetrics {
        &self.metrics
    }

    pub async fn get_status(&self) -> HealthStatus {
        let sources = self.sources.read().await.clone();
        let last_cycle_at = *self.last_cycle_at.read().await;

        let status = if last_cycle_at.is_none() {
            "starting"
        } else if sources.values().all(|s| s.healthy) {
            "healthy"
        } else {
            "degraded"
        };

        HealthStatus {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            last_cycle_at,
            sources,
            metrics: self.metrics.snapshot(),
        }
    }

    pub async fn update_source(&self, source: &str, error: Option<String>) {
        let mut sources = self.sources.write().await;
        sources.insert(
            source.to_string(),
            SourceHealth {
                healthy: error.is_none(),
                last_checked: Utc::now(),
                last_error: error,
            },
        );
    }

    pub async fn mark_cycle_complete(&self) {
        *self.last_cycle_at.write().await = Some(Utc::now());
    }
}
