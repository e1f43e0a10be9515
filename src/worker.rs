// src/worker.rs
//
// One worker per configured client. The loop is cooperative: the
// cancellation token is checked at the top of every iteration, and an
// in-flight execute call always runs to completion first.

use rand::distr::{Alphanumeric, SampleString};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::executor::{KvExecutor, KvRequest};
use crate::keyspace::KeySpace;
use crate::progress::ProgressStore;
use crate::selector::{OpKind, OpRatios};
use crate::stats::StatsAggregator;

/// Everything a worker shares with the rest of the run
#[derive(Clone)]
pub struct RunContext {
    pub keys: KeySpace,
    pub ratios: OpRatios,
    pub ttl: Option<Duration>,
    pub value_size: usize,
    pub stats: Arc<StatsAggregator>,
    pub progress: ProgressStore,
    pub executor: Arc<dyn KvExecutor>,
    pub cancel: CancellationToken,
}

pub struct Worker {
    id: usize,
    ctx: RunContext,
    rng: StdRng,
}

impl Worker {
    /// `seed` makes the operation/key sequence reproducible
    pub fn new(id: usize, ctx: RunContext, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s.wrapping_add(id as u64)),
            None => StdRng::from_os_rng(),
        };
        Self { id, ctx, rng }
    }

    /// Run until cancelled; returns the number of successful operations
    pub async fn run(mut self) -> u64 {
        let mut ok = 0u64;
        let mut payload = String::new();

        while !self.ctx.cancel.is_cancelled() {
            if self.ctx.keys.is_empty() {
                break;
            }
            let draw: f64 = self.rng.random();
            let idx = self.rng.random_range(0..self.ctx.keys.len());
            let kind = self.ctx.ratios.select(draw);
            let Some(key) = self.ctx.keys.get(idx) else {
                break;
            };

            let req = match kind {
                OpKind::Set => {
                    fill_payload(&mut self.rng, &mut payload, self.ctx.value_size);
                    KvRequest::set(key, payload.as_bytes(), self.ctx.ttl)
                }
                OpKind::Get => KvRequest::get(key),
                OpKind::Del => KvRequest::del(key),
            }
            .on_client(self.id);

            let t0 = Instant::now();
            match self.ctx.executor.execute(req).await {
                Ok(_) => {
                    let elapsed = t0.elapsed();
                    self.ctx.stats.record(kind, elapsed);
                    if let Some(slot) = self.ctx.progress.worker(self.id) {
                        slot.increment(kind);
                    }
                    ok += 1;
                }
                Err(e) => {
                    debug!(worker = self.id, op = %kind, key, "operation failed: {:#}", e);
                }
            }
        }

        debug!(worker = self.id, ok, "worker stopped");
        ok
    }
}

/// Replace `buf` with `len` random alphanumeric characters
pub fn fill_payload<R: Rng + ?Sized>(rng: &mut R, buf: &mut String, len: usize) {
    buf.clear();
    Alphanumeric.append_string(rng, buf, len);
}
