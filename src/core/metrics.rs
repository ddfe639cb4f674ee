use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-lifetime counters for the monitor loop.
#[derive(Debug, Default)]
pub struct MonitorMetrics {
    cycles_completed: AtomicU64,
    cycles_skipped: AtomicU64,
    source_failures: AtomicU64,
    new_listings: AtomicU64,
    new_announcements: AtomicU64,
    notifications_sent: AtomicU64,
    notification_failures: AtomicU64,
    last_cycle_ms: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub cycles_completed: u64,
    pub cycles_skipped: u64,
    pub source_failures: u64,
    pub new_listings: u64,
    pub new_announcements: u64,
    pub notifications_sent: u64,
    pub notification_failures: u64,
    pub last_cycle_ms: u64,
}

impl MonitorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, elapsed: Duration) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_ms
            .store(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn increment_cycles_skipped(&self) {
        self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_source_failures(&self) {
        self.source_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_new_listings(&self, count: usize) {
        self.new_listings.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn add_new_announcements(&self, count: usize) {
        self.new_announcements
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_notification(&self, success: bool) {
        if success {
            self.notifications_sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.notification_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_skipped: self.cycles_skipped.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            new_listings: self.new_listings.load(Ordering::Relaxed),
            new_announcements: self.new_announcements.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
            last_cycle_ms: self.last_cycle_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = MonitorMetrics::new();
        metrics.record_cycle(Duration::from_millis(1500));
        metrics.add_new_listings(3);
        metrics.record_notification(true);
        metrics.record_notification(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.cycles_completed, 1);
        assert_eq!(snap.last_cycle_ms, 1500);
        assert_eq!(snap.new_listings, 3);
        assert_eq!(snap.notifications_sent, 1);
        assert_eq!(snap.notification_failures, 1);
    }
}
