//! Final run report
//!
//! Built once, after every worker has stopped.

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

use crate::selector::OpKind;
use crate::stats::{OpStatsSnapshot, StatsAggregator};

/// Latency summary in milliseconds; all zero for kinds with no samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

impl From<&OpStatsSnapshot> for LatencySummary {
    fn from(s: &OpStatsSnapshot) -> Self {
        if !s.has_samples() {
            return Self::default();
        }
        Self {
            min_ms: ms(s.min),
            avg_ms: ms(s.avg),
            max_ms: ms(s.max),
            p50_ms: ms(s.p50),
            p95_ms: ms(s.p95),
            p99_ms: ms(s.p99),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KindReport {
    pub kind: OpKind,
    pub count: u64,
    pub ops_per_sec: f64,
    pub latency: LatencySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub clients: usize,
    pub keys: usize,
    /// Configured run duration
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Actual elapsed time including worker shutdown
    pub wall_seconds: f64,
    /// SET, GET, DEL in that order
    pub kinds: [KindReport; 3],
}

impl FinalReport {
    /// Throughput is `count / duration` against the configured duration.
    pub fn build(
        clients: usize,
        keys: usize,
        duration: Duration,
        wall_seconds: f64,
        stats: &StatsAggregator,
    ) -> Self {
        let secs = duration.as_secs_f64();
        let kinds = OpKind::ALL.map(|kind| {
            let snap = stats.snapshot(kind);
            KindReport {
                kind,
                count: snap.count,
                ops_per_sec: if secs > 0.0 { snap.count as f64 / secs } else { 0.0 },
                latency: LatencySummary::from(&snap),
            }
        });
        Self { clients, keys, duration, wall_seconds, kinds }
    }

    pub fn kind(&self, kind: OpKind) -> &KindReport {
        &self.kinds[kind.index()]
    }

    pub fn total_ops(&self) -> u64 {
        self.kinds.iter().map(|k| k.count).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable summary lines
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Total clients: {}", self.clients),
            format!("Total keys: {}", self.keys),
            format!("Total time: {:?}", self.duration),
        ];
        for k in &self.kinds {
            lines.push(format!("{} operations: {}", k.kind, k.count));
        }
        for k in &self.kinds {
            lines.push(format!("Average {} ops/sec: {:.2}", k.kind, k.ops_per_sec));
        }
        for k in &self.kinds {
            let l = &k.latency;
            lines.push(format!(
                "{} Latency (ms): Min={:.2}, Avg={:.2}, Max={:.2}, p50={:.2}, p95={:.2}, p99={:.2}",
                k.kind, l.min_ms, l.avg_ms, l.max_ms, l.p50_ms, l.p95_ms, l.p99_ms
            ));
        }
        lines
    }

    pub fn print_summary(&self) {
        println!("\nBenchmark complete.");
        for line in self.summary_lines() {
            println!("{}", line);
        }
    }
}
