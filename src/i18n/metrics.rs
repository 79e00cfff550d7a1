//! Resolution metrics and observability.
//!
//! Tracks where resolved values came from (staged edits, fallback locales,
//! the persisted store or the raw column) and how many rows were flushed
//! and purged.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Where a resolved value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Staged for the active locale.
    Staged,
    /// Staged for a locale further down the fallback chain.
    StagedFallback,
    /// Read from the translation store.
    Store,
    /// Taken from the untranslated column.
    Raw,
}

/// Counters shared by the components of one translator.
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    staged_hits: AtomicUsize,
    staged_fallback_hits: AtomicUsize,
    store_hits: AtomicUsize,
    raw_fallbacks: AtomicUsize,
    rows_flushed: AtomicUsize,
    rows_purged: AtomicUsize,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one resolution and its source.
    pub fn record_resolution(&self, source: ResolutionSource) {
        let counter = match source {
            ResolutionSource::Staged => &self.staged_hits,
            ResolutionSource::StagedFallback => &self.staged_fallback_hits,
            ResolutionSource::Store => &self.store_hits,
            ResolutionSource::Raw => &self.raw_fallbacks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record rows written by a flush.
    pub fn record_flushed(&self, rows: usize) {
        self.rows_flushed.fetch_add(rows, Ordering::Relaxed);
    }

    /// Record rows deleted when an entity was destroyed.
    pub fn record_purged(&self, rows: usize) {
        self.rows_purged.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn staged_hits(&self) -> usize {
        self.staged_hits.load(Ordering::Relaxed)
    }

    pub fn staged_fallback_hits(&self) -> usize {
        self.staged_fallback_hits.load(Ordering::Relaxed)
    }

    pub fn store_hits(&self) -> usize {
        self.store_hits.load(Ordering::Relaxed)
    }

    pub fn raw_fallbacks(&self) -> usize {
        self.raw_fallbacks.load(Ordering::Relaxed)
    }

    pub fn rows_flushed(&self) -> usize {
        self.rows_flushed.load(Ordering::Relaxed)
    }

    pub fn rows_purged(&self) -> usize {
        self.rows_purged.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let staged = self.staged_hits() + self.staged_fallback_hits();
        let store = self.store_hits();
        let raw = self.raw_fallbacks();
        let total = staged + store + raw;
        let store_hit_rate = if total > 0 {
            (store as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resolutions: total,
            staged_hits: self.staged_hits(),
            staged_fallback_hits: self.staged_fallback_hits(),
            store_hits: store,
            raw_fallbacks: raw,
            store_hit_rate,
            rows_flushed: self.rows_flushed(),
            rows_purged: self.rows_purged(),
        }
    }
}

/// Snapshot of resolution statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Total number of resolutions
    pub resolutions: usize,

    /// Values served from the active locale's staged edits
    pub staged_hits: usize,

    /// Values served from staged edits of a fallback locale
    pub staged_fallback_hits: usize,

    /// Values served from the translation store
    pub store_hits: usize,

    /// Values served from the untranslated column
    pub raw_fallbacks: usize,

    /// Store hit rate as a percentage (0-100)
    pub store_hit_rate: f64,

    /// Rows written by flushes
    pub rows_flushed: usize,

    /// Rows deleted by destroys
    pub rows_purged: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_record_resolution_by_source() {
        let metrics = ResolutionMetrics::new();

        metrics.record_resolution(ResolutionSource::Staged);
        metrics.record_resolution(ResolutionSource::StagedFallback);
        metrics.record_resolution(ResolutionSource::Store);
        metrics.record_resolution(ResolutionSource::Store);
        metrics.record_resolution(ResolutionSource::Raw);

        assert_eq!(metrics.staged_hits(), 1);
        assert_eq!(metrics.staged_fallback_hits(), 1);
        assert_eq!(metrics.store_hits(), 2);
        assert_eq!(metrics.raw_fallbacks(), 1);
    }

    #[test]
    fn test_record_rows() {
        let metrics = ResolutionMetrics::new();
        metrics.record_flushed(3);
        metrics.record_flushed(2);
        metrics.record_purged(4);

        assert_eq!(metrics.rows_flushed(), 5);
        assert_eq!(metrics.rows_purged(), 4);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = ResolutionMetrics::new().report();
        assert_eq!(report.resolutions, 0);
        assert_eq!(report.store_hit_rate, 0.0);
    }

    #[test]
    fn test_report_store_hit_rate() {
        let metrics = ResolutionMetrics::new();
        metrics.record_resolution(ResolutionSource::Store);
        metrics.record_resolution(ResolutionSource::Store);
        metrics.record_resolution(ResolutionSource::Staged);
        metrics.record_resolution(ResolutionSource::Raw);

        let report = metrics.report();
        assert_eq!(report.resolutions, 4);
        assert!((report.store_hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = ResolutionMetrics::new();
        metrics.record_flushed(1);

        let json = serde_json::to_string(&metrics.report()).expect("Should serialize");
        assert!(json.contains("\"rows_flushed\":1"));
        assert!(json.contains("\"store_hit_rate\""));
    }
}
