use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use super::diff;
use super::notifier::Notifier;
use super::records::{AnnouncementSnapshot, NewItem, Snapshot, SymbolSnapshot};
use super::snapshot;
use crate::core::config::{DigestMode, MonitorConfig};
use crate::core::error::{MonitorError, MonitorResult};
use crate::core::HealthChecker;
use crate::scanner::{AnnouncementSource, ListingSource, SourceRegistry};

#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub sources_processed: usize,
    pub sources_failed: usize,
    pub new_listings: usize,
    pub new_announcements: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    pub duration: Duration,
}

/// Drives fetch → diff → notify → persist over every registered source.
pub struct ListingMonitor {
    registry: SourceRegistry,
    notifier: Notifier,
    health: HealthChecker,
    settings: MonitorConfig,
    cycle_lock: Mutex<()>,
}

impl ListingMonitor {
    pub fn new(
        registry: SourceRegistry,
        notifier: Notifier,
        health: HealthChecker,
        settings: MonitorConfig,
    ) -> Self {
        Self {
            registry,
            notifier,
            health,
            settings,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Startup cycle, then one cycle per aligned interval until `shutdown` resolves.
    ///
    /// A cycle in progress always finishes before shutdown is observed.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            "🆕 Listing monitor starting ({} sources, every {}s)",
            self.registry.len(),
            self.settings.check_interval.as_secs()
        );

        self.run_cycle().await;

        tokio::pin!(shutdown);
        loop {
            let delay = next_aligned_delay(Utc::now(), self.settings.check_interval);
            tracing::debug!("Next cycle in {:.0}s", delay.as_secs_f64());

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("🛑 Shutdown requested, stopping monitor");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// Run one cycle. Returns `None` when another cycle already holds the lock.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            tracing::warn!("⏭️  Previous cycle still running, skipping this tick");
            self.health.metrics().increment_cycles_skipped();
            return None;
        };

        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", id = %cycle_id);

        let report = self.run_cycle_inner(cycle_id).instrument(span).await;
        Some(report)
    }

    async fn run_cycle_inner(&self, cycle_id: Uuid) -> CycleReport {
        let start = Instant::now();
        let mut report = CycleReport {
            cycle_id,
            ..Default::default()
        };
        let mut pending: Vec<NewItem> = Vec::new();

        tracing::info!("🔄 Cycle started");

        for source in self.registry.listings() {
            let label = format!("listings:{}", source.exchange());
            let outcome = AssertUnwindSafe(self.process_listing_source(
                source.as_ref(),
                &mut pending,
                &mut report,
            ))
            .catch_unwind()
            .await;
            self.record_source_outcome(&label, outcome, &mut report).await;
        }

        for source in self.registry.announcements() {
            let label = format!("announcements:{}", source.exchange());
            let outcome = AssertUnwindSafe(self.process_announcement_source(
                source.as_ref(),
                &mut pending,
                &mut report,
            ))
            .catch_unwind()
            .await;
            self.record_source_outcome(&label, outcome, &mut report).await;
        }

        if !pending.is_empty() {
            self.send_digest(&pending, &mut report).await;
        }

        report.duration = start.elapsed();
        self.health.metrics().record_cycle(report.duration);
        self.health.mark_cycle_complete().await;

        tracing::info!(
            "✅ Cycle complete in {:.2}s: {} sources ({} failed), {} new listings, {} new announcements",
            report.duration.as_secs_f64(),
            report.sources_processed,
            report.sources_failed,
            report.new_listings,
            report.new_announcements
        );

        report
    }

    async fn record_source_outcome(
        &self,
        label: &str,
        outcome: std::thread::Result<MonitorResult<()>>,
        report: &mut CycleReport,
    ) {
        report.sources_processed += 1;

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some("source panicked".to_string()),
        };

        if let Some(e) = &error {
            tracing::error!("❌ {} failed: {}", label, e);
            report.sources_failed += 1;
            self.health.metrics().increment_source_failures();
        }

        self.health.update_source(label, error).await;
    }

    async fn process_listing_source(
        &self,
        source: &dyn ListingSource,
        pending: &mut Vec<NewItem>,
        report: &mut CycleReport,
    ) -> MonitorResult<()> {
        let path = source.data_file_path();
        let first_run = !snapshot_exists(path).await;
        let previous: SymbolSnapshot = snapshot::load(path).await;

        let current = source.try_fetch_listings().await?;
        if current.is_empty() {
            return Err(MonitorError::Api {
                exchange: source.exchange().to_string(),
                message: "no symbols returned".to_string(),
            });
        }

        let new = diff::diff(&diff::key_set(previous.records()), &current);
        if new.is_empty() {
            tracing::debug!("{}: no new symbols ({} known)", source.exchange(), previous.symbols.len());
            return Ok(());
        }

        tracing::info!("🆕 {}: {} new symbols", source.exchange(), new.len());
        for record in new.iter().take(10) {
            tracing::info!("  {} ({}/{})", record.symbol, record.base_asset, record.quote_asset);
        }
        if new.len() > 10 {
            tracing::info!("  ... and {} more", new.len() - 10);
        }

        report.new_listings += new.len();
        self.health.metrics().add_new_listings(new.len());

        let items = new.iter().cloned().map(NewItem::Listing).collect();
        let unbounded = HashSet::new();
        self.persist(path, previous, new, (0, &unbounded), items, first_run, pending, report)
            .await
    }

    async fn process_announcement_source(
        &self,
        source: &dyn AnnouncementSource,
        pending: &mut Vec<NewItem>,
        report: &mut CycleReport,
    ) -> MonitorResult<()> {
        let path = source.data_file_path();
        let first_run = !snapshot_exists(path).await;
        let previous: AnnouncementSnapshot = snapshot::load(path).await;

        let current = source.try_fetch_announcements().await?;
        let new = diff::diff(&diff::key_set(previous.records()), &current);
        if new.is_empty() {
            tracing::debug!("{}: no new announcements", source.exchange());
            return Ok(());
        }

        tracing::info!("📰 {}: {} new announcements", source.exchange(), new.len());
        for a in &new {
            tracing::info!("  {}", a.title);
        }

        report.new_announcements += new.len();
        self.health.metrics().add_new_announcements(new.len());

        let items = new.iter().cloned().map(NewItem::Announcement).collect();
        let limit = self.settings.announcement_history_limit;
        let still_listed = diff::key_set(&current);
        self.persist(path, previous, new, (limit, &still_listed), items, first_run, pending, report)
            .await
    }

    /// Notify (or queue) the new items, then merge and save the snapshot.
    ///
    /// `retention` is the history limit plus the keys the source still lists.
    #[allow(clippy::too_many_arguments)]
    async fn persist<S: Snapshot>(
        &self,
        path: &Path,
        mut snapshot: S,
        new: Vec<S::Record>,
        retention: (usize, &HashSet<String>),
        items: Vec<NewItem>,
        first_run: bool,
        pending: &mut Vec<NewItem>,
        report: &mut CycleReport,
    ) -> MonitorResult<()> {
        if first_run && !self.settings.notify_on_first_run {
            tracing::info!(
                "📥 No previous snapshot at {}, recording {} items as baseline",
                path.display(),
                items.len()
            );
        } else {
            match self.settings.digest_mode {
                DigestMode::PerSource => self.send_digest(&items, report).await,
                DigestMode::PerCycle => pending.extend(items),
            }
        }

        let (limit, still_listed) = retention;
        let dropped = diff::merge(&mut snapshot, new, limit, still_listed);
        if dropped > 0 {
            tracing::debug!("Trimmed {} old records from {}", dropped, path.display());
        }

        snapshot::save(path, &snapshot).await
    }

    async fn send_digest(&self, items: &[NewItem], report: &mut CycleReport) {
        let outcome = self.notifier.notify(items).await;
        self.health.metrics().record_notification(outcome.success);

        if outcome.success {
            report.notifications_sent += 1;
        } else {
            report.notifications_failed += 1;
            tracing::warn!("Digest not delivered: {}", outcome.message);
        }
    }
}

async fn snapshot_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Time until the next wall-clock multiple of `period`, in `(0, period]`.
pub fn next_aligned_delay(now: DateTime<Utc>, period: Duration) -> Duration {
    let period_ms = period.as_millis().max(1) as i64;
    let remainder = now.timestamp_millis().rem_euclid(period_ms);
    Duration::from_millis((period_ms - remainder) as u64)
}
