//! Thread-safe per-operation statistics
//!
//! One `parking_lot::Mutex` per operation kind guards count, total latency,
//! min, max and an HDR histogram together, so every `record` is a single
//! serialized read-modify-write for its kind. Different kinds never share
//! a lock.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::time::Duration;

use crate::constants::{HIST_HIGH_US, HIST_LOW_US, HIST_SIGFIG};
use crate::selector::OpKind;

/// Accumulated latency data for one operation kind
#[derive(Debug, Clone)]
pub struct OpStats {
    pub count: u64,
    pub total: Duration,
    /// `Duration::MAX` until the first sample
    pub min: Duration,
    /// `Duration::ZERO` until the first sample
    pub max: Duration,
    hist: Histogram<u64>,
}

impl OpStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            total: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
            hist: Histogram::<u64>::new_with_bounds(HIST_LOW_US, HIST_HIGH_US, HIST_SIGFIG)
                .expect("failed to allocate histogram"),
        }
    }

    fn record(&mut self, latency: Duration) {
        self.count += 1;
        self.total += latency;
        if latency < self.min {
            self.min = latency;
        }
        if latency > self.max {
            self.max = latency;
        }
        let us = latency.as_micros().min(u64::MAX as u128) as u64;
        self.hist.saturating_record(us.max(HIST_LOW_US));
    }

    fn snapshot(&self) -> OpStatsSnapshot {
        let (avg, p50, p95, p99) = if self.count > 0 {
            (
                Duration::from_nanos((self.total.as_nanos() / self.count as u128) as u64),
                Duration::from_micros(self.hist.value_at_quantile(0.50)),
                Duration::from_micros(self.hist.value_at_quantile(0.95)),
                Duration::from_micros(self.hist.value_at_quantile(0.99)),
            )
        } else {
            (Duration::ZERO, Duration::ZERO, Duration::ZERO, Duration::ZERO)
        };
        OpStatsSnapshot {
            count: self.count,
            total: self.total,
            avg,
            min: self.min,
            max: self.max,
            p50,
            p95,
            p99,
        }
    }
}

impl Default for OpStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of one kind's statistics.
///
/// `avg` and the percentiles are zero when `count == 0`; `min`/`max` keep
/// their sentinels, see [`OpStatsSnapshot::has_samples`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpStatsSnapshot {
    pub count: u64,
    pub total: Duration,
    pub avg: Duration,
    pub min: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl OpStatsSnapshot {
    #[inline]
    pub fn has_samples(&self) -> bool {
        self.count > 0
    }
}

/// Shared statistics for a single run, one lock domain per [`OpKind`]
#[derive(Debug)]
pub struct StatsAggregator {
    kinds: [Mutex<OpStats>; 3],
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            kinds: [
                Mutex::new(OpStats::new()),
                Mutex::new(OpStats::new()),
                Mutex::new(OpStats::new()),
            ],
        }
    }

    /// Record one successful operation of `kind`
    #[inline]
    pub fn record(&self, kind: OpKind, latency: Duration) {
        self.kinds[kind.index()].lock().record(latency);
    }

    pub fn snapshot(&self, kind: OpKind) -> OpStatsSnapshot {
        self.kinds[kind.index()].lock().snapshot()
    }

    /// Successful operation count for `kind`
    pub fn count(&self, kind: OpKind) -> u64 {
        self.kinds[kind.index()].lock().count
    }

    /// Counts for SET, GET, DEL in that order
    pub fn counts(&self) -> [u64; 3] {
        OpKind::ALL.map(|k| self.count(k))
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
