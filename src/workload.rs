// src/workload.rs
//
// Run orchestration: validate, connect-check, spawn one worker per client
// plus the optional progress reporter, sleep for the configured duration,
// cancel, join every worker, then build the final report.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::executor::KvExecutor;
use crate::keyspace::KeySpace;
use crate::progress::{run_reporter, ProgressSink, ProgressStore};
use crate::report::FinalReport;
use crate::stats::StatsAggregator;
use crate::worker::{RunContext, Worker};

/// Public entry: run a config against `executor` and return the final report.
///
/// Fatal errors (invalid config, failed connectivity check) are returned
/// before any worker starts. Individual operation failures never surface
/// here; they only lower the counts.
pub async fn run(
    cfg: &Config,
    executor: Arc<dyn KvExecutor>,
    sink: Option<Arc<dyn ProgressSink>>,
) -> Result<FinalReport> {
    let ratios = cfg.validate()?;

    executor
        .ping()
        .await
        .with_context(|| format!("connectivity check failed for {}", executor.describe()))?;

    info!(
        "Starting benchmark: {} clients, {} keys, {:?}, mix set={:.3} get={:.3} del={:.3} against {}",
        cfg.clients,
        cfg.keys,
        cfg.duration,
        ratios.set,
        ratios.get,
        ratios.del,
        executor.describe()
    );

    let stats = Arc::new(StatsAggregator::new());
    let progress = ProgressStore::new(cfg.clients);
    let cancel = CancellationToken::new();

    let ctx = RunContext {
        keys: KeySpace::new(cfg.keys, &cfg.prefix),
        ratios,
        ttl: cfg.write_ttl(),
        value_size: cfg.value_size,
        stats: stats.clone(),
        progress: progress.clone(),
        executor,
        cancel: cancel.clone(),
    };

    let start = Instant::now();

    // Spawn workers
    let mut handles = Vec::with_capacity(cfg.clients);
    for id in 0..cfg.clients {
        let worker = Worker::new(id, ctx.clone(), cfg.seed);
        handles.push(tokio::spawn(worker.run()));
    }
    drop(ctx);

    let reporter = sink.map(|sink| {
        tokio::spawn(run_reporter(
            progress.clone(),
            stats.clone(),
            sink,
            cfg.report_interval,
            cancel.clone(),
        ))
    });

    tokio::time::sleep(cfg.duration).await;
    cancel.cancel();
    debug!("stop signal raised after {:?}", start.elapsed());

    let mut ok_total = 0u64;
    for joined in join_all(handles).await {
        ok_total += joined.context("worker task failed")?;
    }
    if let Some(r) = reporter {
        r.await.context("progress reporter failed")?;
    }

    let wall = start.elapsed().as_secs_f64();
    debug!(ok_total, wall, "all workers stopped");

    Ok(FinalReport::build(cfg.clients, cfg.keys, cfg.duration, wall, &stats))
}
