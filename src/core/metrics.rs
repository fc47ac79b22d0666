//! Per-handler counters
//!
//! Every [`Handler`](crate::Handler) keeps a [`HandlerMetrics`] so callers can
//! see how many records were written, rejected by filters, lost to errors, or
//! dropped by a sink that could not accept them (full queue, lost socket).

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one handler
///
/// # Example
///
/// ```
/// use rust_logging::HandlerMetrics;
///
/// let metrics = HandlerMetrics::new();
/// metrics.record_emitted();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.emitted_count(), 1);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct HandlerMetrics {
    /// Records the sink accepted
    emitted: AtomicU64,

    /// Records rejected by the handler's filters
    filtered: AtomicU64,

    /// Emits that failed and went through error handling
    errors: AtomicU64,

    /// Records the sink discarded without writing
    dropped: AtomicU64,
}

impl HandlerMetrics {
    pub const fn new() -> Self {
        Self {
            emitted: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn emitted_count(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of handled records that never reached the output, 0.0 to 100.0
    pub fn loss_rate(&self) -> f64 {
        let lost = (self.error_count() + self.dropped_count()) as f64;
        let total = self.emitted_count() as f64 + lost;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.emitted.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for HandlerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HandlerMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            emitted: AtomicU64::new(self.emitted_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            errors: AtomicU64::new(self.error_count()),
            dropped: AtomicU64::new(self.dropped_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = HandlerMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped_count(), 2);
    }

    #[test]
    fn test_loss_rate() {
        let metrics = HandlerMetrics::new();
        assert_eq!(metrics.loss_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_emitted();
        }
        for _ in 0..5 {
            metrics.record_error();
            metrics.record_dropped();
        }
        // filtered records are not losses
        metrics.record_filtered();

        let rate = metrics.loss_rate();
        assert!((rate - 10.0).abs() < 1e-9, "loss rate was {}", rate);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let metrics = HandlerMetrics::new();
        metrics.record_emitted();
        let snapshot = metrics.clone();

        metrics.record_emitted();
        metrics.reset();
        assert_eq!(snapshot.emitted_count(), 1);
        assert_eq!(metrics.emitted_count(), 0);
    }
}
