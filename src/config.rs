use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::StatsError;

// ─── Defaults ────────────────────────────────────────────────────

/// Cadence of the periodic report dump.
pub const DEFAULT_DUMP_INTERVAL: Duration = Duration::from_secs(60);

/// Period of the background memory sampler.
pub const DEFAULT_MEMORY_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

/// Completed spans longer than this many milliseconds are retained for the
/// plotting export; shorter ones are discarded.
pub const DEFAULT_RETAIN_THRESHOLD_MS: u64 = 8;

// ─── Config ──────────────────────────────────────────────────────

/// Tunables for one [`StatsContext`](crate::StatsContext).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Directory every report and sample file is written into.
    pub output_dir: PathBuf,

    /// How often the background task dumps all domains.
    pub dump_interval: Duration,

    /// How often memory is polled.
    pub memory_sample_period: Duration,

    /// Span-retention threshold for the frame and event recorders.
    pub retain_threshold_ms: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output_stats"),
            dump_interval: DEFAULT_DUMP_INTERVAL,
            memory_sample_period: DEFAULT_MEMORY_SAMPLE_PERIOD,
            retain_threshold_ms: DEFAULT_RETAIN_THRESHOLD_MS,
        }
    }
}

impl StatsConfig {
    /// Resolve and create the output directory. Failing here is fatal: the
    /// process must not come up half-instrumented and discover the problem
    /// at the first dump.
    pub(crate) fn prepare(&self) -> Result<(), StatsError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(StatsError::Config("output directory is empty".into()));
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|err| {
            StatsError::Config(format!(
                "cannot create output directory {}: {err}",
                self.output_dir.display()
            ))
        })
    }
}
