// src/progress.rs
//
// Live progress tracking and display
//
// Each worker owns one `WorkerProgress` slot and is its only writer. The
// reporter reads every slot with relaxed loads once per interval, so the
// per-worker view is eventually consistent and never takes a lock on the
// worker's hot path. Run totals come from the `StatsAggregator` counts,
// which keeps the live view and the final report on one source of truth.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::selector::OpKind;
use crate::stats::StatsAggregator;

/// SET/GET/DEL counters as plain numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub set: u64,
    pub get: u64,
    pub del: u64,
}

impl KindCounts {
    pub fn from_array(c: [u64; 3]) -> Self {
        Self { set: c[0], get: c[1], del: c[2] }
    }

    pub fn get_kind(&self, kind: OpKind) -> u64 {
        match kind {
            OpKind::Set => self.set,
            OpKind::Get => self.get,
            OpKind::Del => self.del,
        }
    }

    pub fn total(&self) -> u64 {
        self.set + self.get + self.del
    }
}

/// Per-worker counters, written only by the owning worker
#[derive(Debug, Default)]
pub struct WorkerProgress {
    counts: [AtomicU64; 3],
}

impl WorkerProgress {
    #[inline]
    pub fn increment(&self, kind: OpKind) {
        self.counts[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn load(&self) -> KindCounts {
        KindCounts::from_array([
            self.counts[0].load(Ordering::Relaxed),
            self.counts[1].load(Ordering::Relaxed),
            self.counts[2].load(Ordering::Relaxed),
        ])
    }
}

/// One `WorkerProgress` slot per client
#[derive(Debug, Clone)]
pub struct ProgressStore {
    workers: Arc<[WorkerProgress]>,
}

impl ProgressStore {
    pub fn new(clients: usize) -> Self {
        Self {
            workers: (0..clients).map(|_| WorkerProgress::default()).collect(),
        }
    }

    /// Slot owned by worker `id`
    pub fn worker(&self, id: usize) -> Option<&WorkerProgress> {
        self.workers.get(id)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn per_worker(&self) -> Vec<KindCounts> {
        self.workers.iter().map(WorkerProgress::load).collect()
    }

    /// Per-worker counts plus aggregator totals
    pub fn snapshot(&self, stats: &StatsAggregator) -> ProgressSnapshot {
        ProgressSnapshot {
            per_worker: self.per_worker(),
            totals: KindCounts::from_array(stats.counts()),
        }
    }
}

/// Structured snapshot pushed to a [`ProgressSink`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub per_worker: Vec<KindCounts>,
    pub totals: KindCounts,
}

/// Receiver of periodic progress snapshots
pub trait ProgressSink: Send + Sync {
    fn display(&self, snapshot: &ProgressSnapshot);

    /// Called once when reporting ends
    fn finish(&self) {}
}

/// Redraws one line per client plus a totals line in place
pub struct TerminalDisplay {
    _multi: MultiProgress,
    clients: Vec<ProgressBar>,
    total: ProgressBar,
}

impl TerminalDisplay {
    pub fn new(clients: usize) -> Self {
        let multi = MultiProgress::new();
        let style = ProgressStyle::with_template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let mut bars = Vec::with_capacity(clients);
        for i in 0..clients {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(style.clone());
            pb.set_message(format_line(&format!("Client {}", i + 1), &KindCounts::default()));
            bars.push(pb);
        }
        let total = multi.add(ProgressBar::new_spinner());
        total.set_style(style);
        total.set_message(format_line("Total", &KindCounts::default()));

        Self { _multi: multi, clients: bars, total }
    }
}

impl ProgressSink for TerminalDisplay {
    fn display(&self, snapshot: &ProgressSnapshot) {
        for (i, (pb, counts)) in self.clients.iter().zip(&snapshot.per_worker).enumerate() {
            pb.set_message(format_line(&format!("Client {}", i + 1), counts));
        }
        self.total.set_message(format_line("Total", &snapshot.totals));
    }

    fn finish(&self) {
        for pb in &self.clients {
            pb.finish();
        }
        self.total.finish();
    }
}

/// Emits the totals line through `tracing` (non-interactive runs)
#[derive(Debug, Default)]
pub struct LogDisplay;

impl ProgressSink for LogDisplay {
    fn display(&self, snapshot: &ProgressSnapshot) {
        info!("{}", format_line("Total", &snapshot.totals));
    }
}

/// `"<label>: SET=<n>, GET=<n>, DEL=<n>"`
pub fn format_line(label: &str, c: &KindCounts) -> String {
    format!("{}: SET={}, GET={}, DEL={}", label, c.set, c.get, c.del)
}

/// Push a snapshot to `sink` every `interval` until `cancel` fires.
///
/// The first tick fires immediately, so the sink sees an initial (usually
/// all-zero) snapshot right after the workers start.
pub async fn run_reporter(
    progress: ProgressStore,
    stats: Arc<StatsAggregator>,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                sink.display(&progress.snapshot(&stats));
            }
        }
    }

    sink.finish();
    debug!("progress reporter stopped");
}
