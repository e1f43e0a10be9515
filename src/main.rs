// -----------------------------------------------------------------------------
// kv-bench - SET/GET/DEL load generator for Redis-compatible key-value stores
// -----------------------------------------------------------------------------

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use kv_bench::config::Config;
use kv_bench::constants::PASSWORD_ENV;
use kv_bench::executor::{self, Backend};
use kv_bench::progress::{LogDisplay, ProgressSink, TerminalDisplay};
use kv_bench::tsv_export::TsvExporter;
use kv_bench::workload;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as RtBuilder;
use tracing::{info, Level};

// -----------------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------------
/// Flags override values from `--config`; anything unset keeps its default.
#[derive(Parser, Debug)]
#[command(name = "kv-bench", version, about = "Measure throughput and latency of a key-value store under a SET/GET/DEL mix")]
struct Cli {
    /// YAML config file path
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Store address (host:port or redis:// URL)
    #[arg(long)]
    addr: Option<String>,

    /// Store password
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pass: Option<String>,

    /// Database number
    #[arg(long)]
    db: Option<i64>,

    /// Number of concurrent clients
    #[arg(long)]
    clients: Option<usize>,

    /// Number of keys to test
    #[arg(long)]
    keys: Option<usize>,

    /// Key prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Key TTL for SET (e.g. "60s"; "0s" disables expiry)
    #[arg(long, value_parser = humantime::parse_duration)]
    ttl: Option<Duration>,

    /// Test duration (e.g. "10s", "2m")
    #[arg(long, value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

    /// Proportion of SET operations
    #[arg(long)]
    set: Option<f64>,

    /// Proportion of GET operations
    #[arg(long)]
    get: Option<f64>,

    /// Proportion of DEL operations
    #[arg(long)]
    del: Option<f64>,

    /// SET payload size in bytes
    #[arg(long)]
    value_size: Option<usize>,

    /// Base RNG seed for reproducible operation sequences
    #[arg(long)]
    seed: Option<u64>,

    /// Execution backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Simulated per-call latency for the memory backend (e.g. "1ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    memory_latency: Option<Duration>,

    /// Disable live progress. Without a terminal on stderr, progress is
    /// logged at info level and only shows with -v.
    #[arg(long)]
    no_progress: bool,

    /// Print the final report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Export results to <PATH>-results.tsv
    #[arg(long, value_name = "PATH")]
    results_tsv: Option<PathBuf>,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<(Config, Options)> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };

        if let Some(v) = self.addr {
            cfg.addr = v;
        }
        if let Some(v) = self.db {
            cfg.db = v;
        }
        if let Some(v) = self.clients {
            cfg.clients = v;
        }
        if let Some(v) = self.keys {
            cfg.keys = v;
        }
        if let Some(v) = self.prefix {
            cfg.prefix = v;
        }
        if let Some(v) = self.ttl {
            cfg.ttl = v;
        }
        if let Some(v) = self.duration {
            cfg.duration = v;
        }
        if let Some(v) = self.set {
            cfg.set = v;
        }
        if let Some(v) = self.get {
            cfg.get = v;
        }
        if let Some(v) = self.del {
            cfg.del = v;
        }
        if let Some(v) = self.value_size {
            cfg.value_size = v;
        }
        if let Some(v) = self.backend {
            cfg.backend = v;
        }
        if let Some(v) = self.memory_latency {
            cfg.memory_latency = v;
        }
        if self.pass.is_some() {
            cfg.pass = self.pass;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }

        let opts = Options {
            progress: !self.no_progress,
            json: self.json,
            results_tsv: self.results_tsv,
        };
        Ok((cfg, opts))
    }
}

struct Options {
    progress: bool,
    json: bool,
    results_tsv: Option<PathBuf>,
}

// -----------------------------------------------------------------------------
// main
// -----------------------------------------------------------------------------
fn main() -> Result<()> {
    // Load environment: KV_BENCH_PASS, RUST_LOG, etc.
    dotenv().ok();

    let cli = Cli::parse();

    // -v (1): info, -vv (2): debug, -vvv (3+): trace; default warn.
    // RUST_LOG takes precedence when set.
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kv_bench={}", level)));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let (cfg, opts) = cli.into_config()?;

    let rt = RtBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(run_benchmark(cfg, opts))
}

async fn run_benchmark(cfg: Config, opts: Options) -> Result<()> {
    // Fatal config errors are reported before any connection attempt
    cfg.validate()?;

    let exec = executor::connect(&cfg).await?;

    let choice = choose_sink(
        opts.progress,
        opts.json,
        std::io::stderr().is_terminal(),
        tracing::enabled!(target: "kv_bench::progress", Level::INFO),
    );
    let sink: Option<Arc<dyn ProgressSink>> = match choice {
        SinkChoice::Terminal => Some(Arc::new(TerminalDisplay::new(cfg.clients))),
        SinkChoice::Log => Some(Arc::new(LogDisplay)),
        SinkChoice::Off => None,
    };

    if !opts.json {
        println!("Starting benchmark...");
    }
    let report = workload::run(&cfg, exec, sink).await?;

    if opts.json {
        println!("{}", report.to_json()?);
    } else {
        report.print_summary();
    }

    if let Some(path) = opts.results_tsv {
        let written = TsvExporter::new(&path).export(&report)?;
        if opts.json {
            info!("TSV results exported to: {}", written.display());
        } else {
            println!("\nTSV results exported to: {}", written.display());
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkChoice {
    Terminal,
    Log,
    Off,
}

/// indicatif draws on stderr; the log fallback only runs when its lines would show
fn choose_sink(progress: bool, json: bool, stderr_tty: bool, info_logged: bool) -> SinkChoice {
    if !progress {
        SinkChoice::Off
    } else if stderr_tty && !json {
        SinkChoice::Terminal
    } else if info_logged {
        SinkChoice::Log
    } else {
        SinkChoice::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_sink() {
        assert_eq!(choose_sink(false, false, true, true), SinkChoice::Off);
        assert_eq!(choose_sink(true, false, true, false), SinkChoice::Terminal);
        assert_eq!(choose_sink(true, true, true, true), SinkChoice::Log);
        assert_eq!(choose_sink(true, false, false, true), SinkChoice::Log);
        // No terminal and info filtered out: nothing would be visible
        assert_eq!(choose_sink(true, false, false, false), SinkChoice::Off);
        assert_eq!(choose_sink(true, true, true, false), SinkChoice::Off);
    }
}
