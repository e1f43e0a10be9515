//! End-to-end workload runs against mock executors
//!
//! These exercise the full orchestration path: validation, connectivity
//! check, worker spawn, timed run, cancellation and join.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use kv_bench::config::Config;
use kv_bench::executor::{KvExecutor, KvRequest, MemoryExecutor, OpOutcome};
use kv_bench::progress::{ProgressSink, ProgressSnapshot};
use kv_bench::report::LatencySummary;
use kv_bench::workload;
use kv_bench::OpKind;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Always succeeds after a fixed simulated round-trip.
/// Tracks how many calls overlap at most.
struct FixedLatency {
    latency: Duration,
    calls: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

impl FixedLatency {
    fn new(latency: Duration) -> Self {
        Self {
            latency,
            calls: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            peak_in_flight: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl KvExecutor for FixedLatency {
    async fn execute(&self, req: KvRequest<'_>) -> Result<OpOutcome> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(match req.kind {
            OpKind::Set => OpOutcome::Stored,
            OpKind::Get => OpOutcome::Found,
            OpKind::Del => OpOutcome::Deleted(1),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "fixed-latency mock".to_string()
    }
}

/// Every operation fails; the connectivity check succeeds
struct AlwaysFail {
    calls: AtomicU64,
}

#[async_trait]
impl KvExecutor for AlwaysFail {
    async fn execute(&self, _req: KvRequest<'_>) -> Result<OpOutcome> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::task::yield_now().await;
        Err(anyhow!("connection reset by peer"))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "always-fail mock".to_string()
    }
}

/// Store is unreachable
struct Unreachable {
    calls: AtomicU64,
}

#[async_trait]
impl KvExecutor for Unreachable {
    async fn execute(&self, _req: KvRequest<'_>) -> Result<OpOutcome> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(anyhow!("unreachable"))
    }

    async fn ping(&self) -> Result<()> {
        Err(anyhow!("connection refused"))
    }

    fn describe(&self) -> String {
        "unreachable mock".to_string()
    }
}

/// Records the client id on every request
#[derive(Default)]
struct ClientIds {
    seen: Mutex<BTreeSet<usize>>,
}

#[async_trait]
impl KvExecutor for ClientIds {
    async fn execute(&self, req: KvRequest<'_>) -> Result<OpOutcome> {
        self.seen.lock().insert(req.client);
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(OpOutcome::Stored)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "client-id mock".to_string()
    }
}

#[derive(Default)]
struct RecordingSink {
    snapshots: Mutex<Vec<ProgressSnapshot>>,
    finished: Mutex<bool>,
}

impl ProgressSink for RecordingSink {
    fn display(&self, snapshot: &ProgressSnapshot) {
        self.snapshots.lock().push(snapshot.clone());
    }

    fn finish(&self) {
        *self.finished.lock() = true;
    }
}

fn base_config() -> Config {
    Config {
        clients: 4,
        keys: 10,
        duration: Duration::from_millis(200),
        set: 1.0,
        get: 0.0,
        del: 0.0,
        ..Config::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_write_only_run_with_fixed_latency() {
    let cfg = base_config();
    let exec = Arc::new(FixedLatency::new(Duration::from_millis(1)));

    let report = workload::run(&cfg, exec.clone(), None).await.unwrap();

    let set = report.kind(OpKind::Set);
    assert_eq!(report.kind(OpKind::Get).count, 0);
    assert_eq!(report.kind(OpKind::Del).count, 0);
    assert!(set.count > 0, "expected some SET operations");
    assert_eq!(set.count, exec.calls.load(Ordering::Relaxed));

    // Every op sleeps at least 1ms; timer granularity can stretch it a little
    assert!(set.latency.min_ms >= 1.0, "min = {}", set.latency.min_ms);
    assert!(set.latency.avg_ms < 10.0, "avg = {}", set.latency.avg_ms);
    assert!(set.latency.max_ms >= set.latency.avg_ms);

    // 4 workers at >= 1ms/op cannot exceed 4 ops per elapsed millisecond
    let wall_ms = report.wall_seconds * 1000.0;
    assert!((set.count as f64) <= 4.0 * wall_ms + 4.0);

    // Workers run side by side: all 4 overlap, and the total is well past
    // what one worker could do at the measured average latency
    assert_eq!(exec.peak_in_flight.load(Ordering::SeqCst), 4);
    let one_worker = 0.2 / (set.latency.avg_ms / 1000.0);
    assert!(
        set.count as f64 > 1.5 * one_worker,
        "count = {}, single-worker capacity = {:.0}",
        set.count,
        one_worker
    );
    assert!((set.ops_per_sec - set.count as f64 / 0.2).abs() < 1e-6);
    assert_eq!(report.clients, 4);
    assert_eq!(report.keys, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_client_issues_on_its_own_id() {
    let exec = Arc::new(ClientIds::default());
    workload::run(&base_config(), exec.clone(), None).await.unwrap();
    assert_eq!(*exec.seen.lock(), BTreeSet::from([0, 1, 2, 3]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_all_failures_yield_zero_report() {
    let cfg = Config { set: 0.5, get: 0.4, del: 0.1, ..base_config() };
    let exec = Arc::new(AlwaysFail { calls: AtomicU64::new(0) });

    let report = workload::run(&cfg, exec.clone(), None).await.unwrap();

    assert!(exec.calls.load(Ordering::Relaxed) > 0);
    for kind in OpKind::ALL {
        let k = report.kind(kind);
        assert_eq!(k.count, 0);
        assert_eq!(k.ops_per_sec, 0.0);
        assert_eq!(k.latency, LatencySummary::default());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_zero_duration_returns_without_deadlock() {
    let cfg = Config { duration: Duration::ZERO, ..base_config() };
    let exec = Arc::new(FixedLatency::new(Duration::from_millis(1)));

    let started = Instant::now();
    let report = tokio::time::timeout(Duration::from_secs(5), workload::run(&cfg, exec, None))
        .await
        .expect("run must not hang")
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(report.duration, Duration::ZERO);
    for kind in OpKind::ALL {
        assert_eq!(report.kind(kind).ops_per_sec, 0.0);
        assert!(report.kind(kind).latency.avg_ms.is_finite());
    }
}

#[tokio::test]
async fn test_failed_ping_is_fatal() {
    let exec = Arc::new(Unreachable { calls: AtomicU64::new(0) });
    let err = workload::run(&base_config(), exec.clone(), None)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("connection refused"));
    assert_eq!(exec.calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_zero_ratios_are_fatal() {
    let cfg = Config { set: 0.0, get: 0.0, del: 0.0, ..base_config() };
    let exec = Arc::new(FixedLatency::new(Duration::from_millis(1)));

    assert!(workload::run(&cfg, exec.clone(), None).await.is_err());
    assert_eq!(exec.calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_zero_keys_are_fatal() {
    let cfg = Config { keys: 0, ..base_config() };
    let exec = Arc::new(MemoryExecutor::new());
    assert!(workload::run(&cfg, exec, None).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_get_misses_count_as_success() {
    // Empty store: every GET is a miss, which must still be recorded
    let cfg = Config { set: 0.0, get: 1.0, del: 0.0, ..base_config() };
    let exec = Arc::new(MemoryExecutor::with_latency(Duration::from_millis(1)));

    let report = workload::run(&cfg, exec, None).await.unwrap();
    assert!(report.kind(OpKind::Get).count > 0);
    assert_eq!(report.kind(OpKind::Set).count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_workload_hits_every_kind() {
    let cfg = Config {
        set: 5.0,
        get: 4.0,
        del: 1.0,
        seed: Some(7),
        ..base_config()
    };
    let exec = Arc::new(MemoryExecutor::with_latency(Duration::from_millis(1)));

    let report = workload::run(&cfg, exec, None).await.unwrap();
    let (s, g, d) = (
        report.kind(OpKind::Set).count as f64,
        report.kind(OpKind::Get).count as f64,
        report.kind(OpKind::Del).count as f64,
    );
    assert!(s > 0.0 && g > 0.0 && d > 0.0);

    // Loose share check; hundreds of samples at 50/40/10
    let total = s + g + d;
    assert!((s / total - 0.5).abs() < 0.15, "set share {}", s / total);
    assert!((d / total - 0.1).abs() < 0.1, "del share {}", d / total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_live_snapshots_agree_with_final_report() {
    let cfg = Config {
        duration: Duration::from_millis(350),
        report_interval: Duration::from_millis(100),
        set: 1.0,
        get: 1.0,
        del: 1.0,
        ..base_config()
    };
    let exec = Arc::new(FixedLatency::new(Duration::from_millis(1)));
    let sink = Arc::new(RecordingSink::default());

    let report = workload::run(&cfg, exec, Some(sink.clone() as Arc<dyn ProgressSink>)).await.unwrap();

    let snaps = sink.snapshots.lock();
    assert!(snaps.len() >= 3, "got {} snapshots", snaps.len());
    assert!(*sink.finished.lock());

    for s in snaps.iter() {
        assert_eq!(s.per_worker.len(), 4);
    }
    // Totals never go backwards and never exceed the final counts
    for pair in snaps.windows(2) {
        assert!(pair[1].totals.total() >= pair[0].totals.total());
    }
    let last = snaps.last().unwrap();
    for kind in OpKind::ALL {
        assert!(last.totals.get_kind(kind) <= report.kind(kind).count);
    }
}
