//! Execution backends
//!
//! Workers only see the [`KvExecutor`] trait. A backend turns one
//! [`KvRequest`] into a store round-trip and reports success as an
//! [`OpOutcome`]; any `Err` is a failed operation that the worker drops
//! from the statistics.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::selector::OpKind;

pub mod memory;
pub mod redis_backend;

pub use memory::MemoryExecutor;
pub use redis_backend::RedisExecutor;

/// One operation to run against the store
#[derive(Debug, Clone, Copy)]
pub struct KvRequest<'a> {
    pub kind: OpKind,
    pub key: &'a str,
    /// Payload, present for SET only
    pub value: Option<&'a [u8]>,
    /// Expiry applied by SET; `None` stores without expiry
    pub ttl: Option<Duration>,
    /// Issuing client; backends with one connection per client route on it
    pub client: usize,
}

impl<'a> KvRequest<'a> {
    pub fn set(key: &'a str, value: &'a [u8], ttl: Option<Duration>) -> Self {
        Self { kind: OpKind::Set, key, value: Some(value), ttl, client: 0 }
    }

    pub fn get(key: &'a str) -> Self {
        Self { kind: OpKind::Get, key, value: None, ttl: None, client: 0 }
    }

    pub fn del(key: &'a str) -> Self {
        Self { kind: OpKind::Del, key, value: None, ttl: None, client: 0 }
    }

    pub fn on_client(mut self, client: usize) -> Self {
        self.client = client;
        self
    }
}

/// Successful result of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Stored,
    Found,
    /// GET on a missing key. Still a success.
    NotFound,
    /// Number of keys removed by DEL (0 or 1)
    Deleted(u64),
}

/// Capability to execute single operations against a key-value store
#[async_trait]
pub trait KvExecutor: Send + Sync {
    async fn execute(&self, req: KvRequest<'_>) -> Result<OpOutcome>;

    /// Connectivity check run once before the workload starts
    async fn ping(&self) -> Result<()>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Which backend the CLI should construct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Remote Redis-compatible server
    #[default]
    Redis,
    /// In-process map, for dry runs without a server
    Memory,
}

/// Build the executor selected by `cfg.backend`
pub async fn connect(cfg: &Config) -> Result<Arc<dyn KvExecutor>> {
    match cfg.backend {
        Backend::Redis => {
            let exec =
                RedisExecutor::connect(&cfg.addr, cfg.pass.as_deref(), cfg.db, cfg.clients).await?;
            Ok(Arc::new(exec))
        }
        Backend::Memory => Ok(Arc::new(MemoryExecutor::with_latency(cfg.memory_latency))),
    }
}
