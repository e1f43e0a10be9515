// src/executor/redis_backend.rs
//
// Redis-compatible backend on top of the `redis` crate's tokio ConnectionManager.
// One manager per configured client, so worker i always talks over its own
// socket. Managers reconnect on their own; individual commands are never
// retried here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo};
use std::time::Duration;
use tracing::info;

use super::{KvExecutor, KvRequest, OpOutcome};
use crate::selector::OpKind;

pub struct RedisExecutor {
    conns: Vec<ConnectionManager>,
    addr: String,
    db: i64,
}

impl RedisExecutor {
    /// Open `clients` managed connections to `addr` (`host:port` or a
    /// `redis://` URL).
    ///
    /// `db` only applies to `host:port`; a URL carries its own database.
    pub async fn connect(addr: &str, pass: Option<&str>, db: i64, clients: usize) -> Result<Self> {
        let url = connection_url(addr, db);
        let mut info = url
            .as_str()
            .into_connection_info()
            .with_context(|| format!("invalid store address: {}", addr))?;
        let db = info.redis.db;
        if let Some(p) = pass.filter(|p| !p.is_empty()) {
            info.redis.password = Some(p.to_string());
        }

        let client = redis::Client::open(info).context("failed to build redis client")?;
        let conns = try_join_all((0..clients.max(1)).map(|_| client.get_connection_manager()))
            .await
            .with_context(|| format!("failed to connect to {}", addr))?;
        info!("Connected to {} (db {}) with {} connections", addr, db, conns.len());

        Ok(Self { conns, addr: addr.to_string(), db })
    }

    fn conn_for(&self, client: usize) -> ConnectionManager {
        self.conns[client_slot(client, self.conns.len())].clone()
    }
}

/// Connection index for a client id; ids past the pool wrap around
fn client_slot(client: usize, pool: usize) -> usize {
    client % pool.max(1)
}

/// PSETEX argument for a write TTL. Sub-millisecond expiries round up to 1ms.
fn ttl_millis(ttl: Option<Duration>) -> Option<u64> {
    ttl.filter(|t| !t.is_zero())
        .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX).max(1))
}

/// `host:port` becomes `redis://host:port/<db>`; full URLs pass through
fn connection_url(addr: &str, db: i64) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("redis://{}/{}", addr, db)
    }
}

#[async_trait]
impl KvExecutor for RedisExecutor {
    async fn execute(&self, req: KvRequest<'_>) -> Result<OpOutcome> {
        let mut conn = self.conn_for(req.client);
        match req.kind {
            OpKind::Set => {
                let value = req.value.unwrap_or_default();
                match ttl_millis(req.ttl) {
                    Some(ms) => conn.pset_ex::<_, _, ()>(req.key, value, ms).await?,
                    None => conn.set::<_, _, ()>(req.key, value).await?,
                }
                Ok(OpOutcome::Stored)
            }
            OpKind::Get => {
                let v: Option<Vec<u8>> = conn.get(req.key).await?;
                Ok(match v {
                    Some(_) => OpOutcome::Found,
                    None => OpOutcome::NotFound,
                })
            }
            OpKind::Del => {
                let n: u64 = conn.del(req.key).await?;
                Ok(OpOutcome::Deleted(n))
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        for conn in &self.conns {
            let mut conn = conn.clone();
            let _pong: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .with_context(|| format!("failed to connect to {}", self.addr))?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redis {} db={} connections={}", self.addr, self.db, self.conns.len())
    }
}
