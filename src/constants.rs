// src/constants.rs
//
// Central location for all constants used throughout kv-bench
// This makes tuning and maintenance easier by having all magic numbers in one place

use std::time::Duration;

// =============================================================================
// Target Defaults
// =============================================================================

/// Default store address (host:port)
pub const DEFAULT_ADDR: &str = "localhost:6379";

/// Default logical database index
pub const DEFAULT_DB: i64 = 0;

/// Environment variable consulted for the store password
pub const PASSWORD_ENV: &str = "KV_BENCH_PASS";

// =============================================================================
// Workload Defaults
// =============================================================================

/// Number of concurrent clients (one tokio task each)
pub const DEFAULT_CLIENTS: usize = 10;

/// Size of the fixed key space
pub const DEFAULT_KEYS: usize = 1000;

/// Prefix prepended to every key index
pub const DEFAULT_KEY_PREFIX: &str = "benchmark_";

/// TTL applied to every SET
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Wall time of the measured run
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);

/// Raw (un-normalized) operation weights
pub const DEFAULT_SET_RATIO: f64 = 0.5;
pub const DEFAULT_GET_RATIO: f64 = 0.4;
pub const DEFAULT_DEL_RATIO: f64 = 0.1;

/// Length of the random alphanumeric payload written by SET
pub const DEFAULT_VALUE_SIZE: usize = 100;

// =============================================================================
// Reporting
// =============================================================================

/// Interval between live progress snapshots
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Tolerance used when checking that normalized ratios sum to 1.0
pub const RATIO_EPSILON: f64 = 1e-9;

// =============================================================================
// Latency Histograms
// =============================================================================

/// Lowest trackable latency (microseconds)
pub const HIST_LOW_US: u64 = 1;

/// Highest trackable latency: 1 hour in microseconds
pub const HIST_HIGH_US: u64 = 3_600_000_000;

/// Significant figures kept by each HDR histogram
pub const HIST_SIGFIG: u8 = 3;
