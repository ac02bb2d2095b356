use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use evs_core::errors::{ErrorInfo, EvsError};
use evs_core::provenance::{RunProvenance, SchemaVersion};

use crate::canonical::to_canonical_json_bytes;
use crate::config::RunConfig;
use crate::histo::PlotBook;

/// Version of the mini-tree column layout.
pub const MINITREE_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Event counters accumulated over a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EventCounts {
    /// Events fully processed.
    pub processed: u64,
    /// Events whose gen level passed all cuts.
    pub gen_good: u64,
    /// Events whose rec level passed all cuts.
    pub rec_good: u64,
    /// Events good at both levels.
    pub both_good: u64,
    /// Records handed to the sink.
    pub emitted: u64,
}

/// Outcome of a finalized run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Name of the analysis variant.
    pub analysis: String,
    /// Event counters.
    pub counts: EventCounts,
    /// Number of histograms and migration matrices in the plot book.
    pub plots: usize,
    /// Provenance metadata describing the run.
    pub provenance: RunProvenance,
}

impl RunSummary {
    /// Fraction of processed events good at both levels.
    pub fn both_good_fraction(&self) -> f64 {
        if self.counts.processed == 0 {
            0.0
        } else {
            self.counts.both_good as f64 / self.counts.processed as f64
        }
    }
}

/// Builds the provenance block for a run.
pub fn provenance(config: &RunConfig) -> Result<RunProvenance, EvsError> {
    let mut versions = BTreeMap::new();
    versions.insert(
        "evs-pipeline".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    Ok(RunProvenance {
        config_hash: config.config_hash()?,
        chain: config.chain.clone(),
        sys_shift: config.sys_shift.as_raw(),
        schema_version: MINITREE_SCHEMA,
        created_at: Utc::now().to_rfc3339(),
        tool_versions: versions,
    })
}

/// Counts the booked plots.
pub fn plot_count(plots: &PlotBook) -> usize {
    plots.histograms.len() + plots.migrations.len()
}

/// Writes `value` as canonical JSON, creating parent directories.
pub fn write_canonical_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EvsError> {
    let bytes = to_canonical_json_bytes(value)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| io_error("report.mkdir", path, err))?;
    }
    fs::write(path, bytes).map_err(|err| io_error("report.write", path, err))
}

fn io_error(code: &str, path: &Path, err: impl ToString) -> EvsError {
    EvsError::Sink(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}
