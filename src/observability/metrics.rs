//! Metrics registry for polyquery
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics registry containing all request counters
///
/// A single registry is shared by every request served by one pipeline.
/// Relaxed ordering is sufficient: counters are independent of each other.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Questions received
    queries_received: AtomicU64,
    /// Requests that produced a result table
    queries_executed: AtomicU64,
    /// Requests that ended in an error
    queries_rejected: AtomicU64,
    /// Generator outputs replaced by a default query
    malformed_recoveries: AtomicU64,
    /// Fields kept as raw text
    decode_fallbacks: AtomicU64,
    /// Requests emptied by an uncoercible predicate
    predicate_rejections: AtomicU64,
    /// Keys skipped because they were not records
    records_skipped: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment questions received
    pub fn increment_queries_received(&self) {
        self.queries_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries executed
    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment queries rejected
    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment malformed-query recoveries
    pub fn increment_malformed_recoveries(&self) {
        self.malformed_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Add decode fallbacks observed during one execution
    pub fn add_decode_fallbacks(&self, count: u64) {
        self.decode_fallbacks.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment predicate rejections
    pub fn increment_predicate_rejections(&self) {
        self.predicate_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Add skipped records observed during one execution
    pub fn add_records_skipped(&self, count: u64) {
        self.records_skipped.fetch_add(count, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_received: self.queries_received.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            malformed_recoveries: self.malformed_recoveries.load(Ordering::Relaxed),
            decode_fallbacks: self.decode_fallbacks.load(Ordering::Relaxed),
            predicate_rejections: self.predicate_rejections.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub queries_received: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub malformed_recoveries: u64,
    pub decode_fallbacks: u64,
    pub predicate_rejections: u64,
    pub records_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = MetricsRegistry::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.increment_queries_received();
        metrics.increment_queries_received();
        metrics.increment_queries_executed();
        metrics.add_decode_fallbacks(3);
        metrics.add_records_skipped(0);

        let snap = metrics.snapshot();
        assert_eq!(snap.queries_received, 2);
        assert_eq!(snap.queries_executed, 1);
        assert_eq!(snap.decode_fallbacks, 3);
        assert_eq!(snap.records_skipped, 0);
    }
}
