// Performance metrics module
//
// Lightweight counters for toggle resolution, saves and registry traffic

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session metrics
///
/// Uses atomic operations for thread-safe tracking without locks. Shared via
/// `Arc` between the services and the session controller, and logged on
/// shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Toggles applied to the selection state
    pub toggles_applied: AtomicUsize,

    /// Toggles rejected for missing prerequisites
    pub toggles_rejected: AtomicUsize,

    /// Saves that reached the registry
    pub saves_committed: AtomicUsize,

    /// Saves short-circuited because nothing changed
    pub saves_skipped: AtomicUsize,

    /// Saves the registry refused
    pub saves_failed: AtomicUsize,

    /// Registry pattern queries issued
    pub registry_queries: AtomicU64,

    /// Entry updates sent in committed batches
    pub entries_written: AtomicU64,

    /// Entries dropped by the grouper for lacking a grouping key
    pub entries_dropped: AtomicU64,

    /// Number of state broadcasts sent
    pub state_broadcasts: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            toggles_applied: AtomicUsize::new(0),
            toggles_rejected: AtomicUsize::new(0),
            saves_committed: AtomicUsize::new(0),
            saves_skipped: AtomicUsize::new(0),
            saves_failed: AtomicUsize::new(0),
            registry_queries: AtomicU64::new(0),
            entries_written: AtomicU64::new(0),
            entries_dropped: AtomicU64::new(0),
            state_broadcasts: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_toggle_applied(&self) {
        self.toggles_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_toggle_rejected(&self) {
        self.toggles_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed save of `entries` updates
    pub fn record_save_committed(&self, entries: usize) {
        self.saves_committed.fetch_add(1, Ordering::Relaxed);
        self.entries_written
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub fn record_save_skipped(&self) {
        self.saves_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failed(&self) {
        self.saves_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_registry_query(&self) {
        self.registry_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_entries_dropped(&self, count: usize) {
        self.entries_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_state_broadcast(&self) {
        self.state_broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Share of toggle requests that were rejected, 0.0 when there were none
    pub fn rejection_rate(&self) -> f64 {
        let rejected = self.toggles_rejected.load(Ordering::Relaxed);
        let total = rejected + self.toggles_applied.load(Ordering::Relaxed);
        if total > 0 {
            rejected as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Toggles: {} applied, {} rejected ({:.0}% rejected)",
            self.toggles_applied.load(Ordering::Relaxed),
            self.toggles_rejected.load(Ordering::Relaxed),
            self.rejection_rate() * 100.0
        );
        tracing::info!(
            "Saves: {} committed, {} skipped, {} failed",
            self.saves_committed.load(Ordering::Relaxed),
            self.saves_skipped.load(Ordering::Relaxed),
            self.saves_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Registry: {} queries, {} entries written, {} entries dropped",
            self.registry_queries.load(Ordering::Relaxed),
            self.entries_written.load(Ordering::Relaxed),
            self.entries_dropped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "State broadcasts: {}",
            self.state_broadcasts.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.toggles_applied.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.saves_committed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_toggles() {
        let metrics = Metrics::new();

        metrics.record_toggle_applied();
        metrics.record_toggle_applied();
        metrics.record_toggle_applied();
        metrics.record_toggle_rejected();

        assert_eq!(metrics.toggles_applied.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.toggles_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rejection_rate(), 0.25);
    }

    #[test]
    fn test_rejection_rate_without_toggles() {
        assert_eq!(Metrics::new().rejection_rate(), 0.0);
    }

    #[test]
    fn test_record_saves() {
        let metrics = Metrics::new();

        metrics.record_save_committed(12);
        metrics.record_save_committed(3);
        metrics.record_save_skipped();
        metrics.record_save_failed();

        assert_eq!(metrics.saves_committed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.entries_written.load(Ordering::Relaxed), 15);
        assert_eq!(metrics.saves_skipped.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.saves_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_registry_counters() {
        let metrics = Metrics::new();

        metrics.record_registry_query();
        metrics.record_entries_dropped(4);
        metrics.record_state_broadcast();

        assert_eq!(metrics.registry_queries.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.entries_dropped.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.state_broadcasts.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
