//! TSV export for machine-readable benchmark results

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::report::FinalReport;

pub const TSV_HEADER: &str =
    "operation\tcount\tops_per_sec\tmin_ms\tavg_ms\tmax_ms\tp50_ms\tp95_ms\tp99_ms";

/// TSV exporter for benchmark results
pub struct TsvExporter {
    basename: String,
}

impl TsvExporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            basename: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Output path: `<basename>-results.tsv`
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}-results.tsv", self.basename))
    }

    /// Write one row per operation kind; returns the file written
    pub fn export(&self, report: &FinalReport) -> Result<PathBuf> {
        let path = self.output_path();
        let mut f = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        writeln!(f, "{}", TSV_HEADER)?;
        for row in rows(report) {
            writeln!(f, "{}", row)?;
        }

        Ok(path)
    }
}

fn rows(report: &FinalReport) -> Vec<String> {
    report
        .kinds
        .iter()
        .map(|k| {
            let l = &k.latency;
            format!(
                "{}\t{}\t{:.2}\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{:.3}\t{:.3}",
                k.kind, k.count, k.ops_per_sec, l.min_ms, l.avg_ms, l.max_ms, l.p50_ms, l.p95_ms, l.p99_ms
            )
        })
        .collect()
}
