// src/executor/memory.rs
//
// In-process backend for dry runs: a HashMap behind a parking_lot::Mutex,
// with TTL expiry checked on read and an optional simulated round-trip latency.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{KvExecutor, KvRequest, OpOutcome};
use crate::selector::OpKind;

struct Entry {
    _value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|t| t > now)
    }
}

#[derive(Default)]
pub struct MemoryExecutor {
    map: Mutex<HashMap<String, Entry>>,
    latency: Duration,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep `latency` before every operation
    pub fn with_latency(latency: Duration) -> Self {
        Self { map: Mutex::default(), latency }
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.map.lock().values().filter(|e| e.is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvExecutor for MemoryExecutor {
    async fn execute(&self, req: KvRequest<'_>) -> Result<OpOutcome> {
        // Always suspend once, like a real round-trip would
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        let now = Instant::now();
        let mut map = self.map.lock();
        let outcome = match req.kind {
            OpKind::Set => {
                let entry = Entry {
                    _value: req.value.unwrap_or_default().to_vec(),
                    expires_at: req.ttl.filter(|t| !t.is_zero()).map(|t| now + t),
                };
                map.insert(req.key.to_string(), entry);
                OpOutcome::Stored
            }
            OpKind::Get => match map.get(req.key).map(|e| e.is_live(now)) {
                Some(true) => OpOutcome::Found,
                Some(false) => {
                    map.remove(req.key);
                    OpOutcome::NotFound
                }
                None => OpOutcome::NotFound,
            },
            OpKind::Del => match map.remove(req.key) {
                Some(e) if e.is_live(now) => OpOutcome::Deleted(1),
                _ => OpOutcome::Deleted(0),
            },
        };
        Ok(outcome)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        format!("memory (latency {:?})", self.latency)
    }
}
