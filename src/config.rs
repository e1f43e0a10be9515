// src/config.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants;
use crate::executor::Backend;
use crate::selector::OpRatios;

/// Run configuration. Every field has a default, so a YAML file only needs
/// the values it changes.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Store address, `host:port` or a full `redis://` URL
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Store password; empty or absent means no AUTH
    #[serde(default)]
    pub pass: Option<String>,

    /// Logical database index
    #[serde(default)]
    pub db: i64,

    /// Number of concurrent clients (workers)
    #[serde(default = "default_clients")]
    pub clients: usize,

    /// Size of the key space
    #[serde(default = "default_keys")]
    pub keys: usize,

    /// Prefix prepended to every key index
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Expiry applied to SET (e.g. "60s"); "0s" stores without expiry
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Measured wall time (e.g. "10s", "2m")
    #[serde(default = "default_duration", with = "humantime_serde")]
    pub duration: Duration,

    /// Raw SET weight (normalized against get + del)
    #[serde(default = "default_set")]
    pub set: f64,

    /// Raw GET weight
    #[serde(default = "default_get")]
    pub get: f64,

    /// Raw DEL weight
    #[serde(default = "default_del")]
    pub del: f64,

    /// Length of the random SET payload in bytes
    #[serde(default = "default_value_size")]
    pub value_size: usize,

    /// Base RNG seed; worker `i` uses `seed + i`. Absent means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Execution backend
    #[serde(default)]
    pub backend: Backend,

    /// Simulated per-call latency for the memory backend
    #[serde(default, with = "humantime_serde")]
    pub memory_latency: Duration,

    /// Interval between live progress snapshots
    #[serde(default = "default_report_interval", with = "humantime_serde")]
    pub report_interval: Duration,
}

fn default_addr() -> String {
    constants::DEFAULT_ADDR.to_string()
}

fn default_clients() -> usize {
    constants::DEFAULT_CLIENTS
}

fn default_keys() -> usize {
    constants::DEFAULT_KEYS
}

fn default_prefix() -> String {
    constants::DEFAULT_KEY_PREFIX.to_string()
}

fn default_ttl() -> Duration {
    constants::DEFAULT_TTL
}

fn default_duration() -> Duration {
    constants::DEFAULT_DURATION
}

fn default_set() -> f64 {
    constants::DEFAULT_SET_RATIO
}

fn default_get() -> f64 {
    constants::DEFAULT_GET_RATIO
}

fn default_del() -> f64 {
    constants::DEFAULT_DEL_RATIO
}

fn default_value_size() -> usize {
    constants::DEFAULT_VALUE_SIZE
}

fn default_report_interval() -> Duration {
    constants::REPORT_INTERVAL
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            pass: None,
            db: constants::DEFAULT_DB,
            clients: default_clients(),
            keys: default_keys(),
            prefix: default_prefix(),
            ttl: default_ttl(),
            duration: default_duration(),
            set: default_set(),
            get: default_get(),
            del: default_del(),
            value_size: default_value_size(),
            seed: None,
            backend: Backend::default(),
            memory_latency: Duration::ZERO,
            report_interval: default_report_interval(),
        }
    }
}

impl Config {
    /// Load a YAML config file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let buf = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        serde_yaml::from_slice(&buf).with_context(|| format!("parse {}", path.display()))
    }

    /// Check every setup invariant and return the normalized operation mix.
    ///
    /// Failures here are fatal: the run never starts.
    pub fn validate(&self) -> Result<OpRatios> {
        if self.clients == 0 {
            bail!("clients must be at least 1");
        }
        if self.keys == 0 {
            bail!("keys must be at least 1 (no valid key to operate on)");
        }
        if self.value_size == 0 {
            bail!("value_size must be at least 1");
        }
        if self.report_interval.is_zero() {
            bail!("report_interval must be greater than zero");
        }
        OpRatios::normalize(self.set, self.get, self.del).context("invalid operation ratios")
    }

    /// TTL passed to SET, `None` when expiry is disabled
    pub fn write_ttl(&self) -> Option<Duration> {
        (!self.ttl.is_zero()).then_some(self.ttl)
    }
}
