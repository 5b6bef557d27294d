use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::clock::EpochClock;
use crate::config::StatsConfig;
use crate::error::StatsError;
use crate::export;
use crate::memory::MemoryMonitor;
use crate::metrics::{Average, EventFrequency, Metric, MetricRow, PeakRate, PowerPunishingRate};
use crate::network::NetworkMonitor;
use crate::recorder::{Recorder, RecorderReport};

// ─── Context ─────────────────────────────────────────────────────

/// Central instrumentation context. Construct one at process start and hand
/// clones of the `Arc`'d members to whatever needs to record — there are no
/// hidden globals, so tests can run several contexts side by side.
pub struct StatsContext {
    clock: EpochClock,
    config: StatsConfig,

    /// Frame creation/update loop timings.
    pub frame_loop: Arc<Recorder>,
    /// Frame-data encoding passes; their spans are attached to `frame_loop`
    /// measurements as children.
    pub frame_encode: Arc<Recorder>,
    /// Input event processing timings.
    pub event_loop: Arc<Recorder>,
    /// Periodically polled memory readings.
    pub memory: Arc<MemoryMonitor>,
    /// Outbound byte counts pushed by the transport.
    pub network: Arc<NetworkMonitor>,

    /// Flag checked by the background tasks on every tick.
    running: Arc<AtomicBool>,
    /// Handles to the sampler/dump tasks so shutdown can await them.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for StatsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsContext").finish_non_exhaustive()
    }
}

impl StatsContext {
    /// Validate the configuration and build every recorder and monitor.
    /// Fails fast when the output directory cannot be prepared.
    pub fn new(config: StatsConfig) -> Result<Self, StatsError> {
        config.prepare()?;
        let clock = EpochClock::new();
        Ok(Self {
            frame_loop: Arc::new(
                Recorder::new("frame update loop", clock, frame_loop_metrics())
                    .with_retention(config.retain_threshold_ms),
            ),
            frame_encode: Arc::new(Recorder::new("encode frame data", clock, Vec::new())),
            event_loop: Arc::new(
                Recorder::new("input event processing", clock, event_loop_metrics())
                    .with_retention(config.retain_threshold_ms),
            ),
            memory: Arc::new(MemoryMonitor::new(clock)),
            network: Arc::new(NetworkMonitor::new(clock)),
            running: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
            clock,
            config,
        })
    }

    /// The process-wide clock every component stamps timestamps with.
    pub fn clock(&self) -> EpochClock {
        self.clock
    }

    /// Spawn the memory sampler and the periodic dump task. Needs a running
    /// tokio runtime; both tasks stop on [`shutdown`](Self::shutdown).
    /// Calling this twice is a no-op.
    pub fn start_background(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut tasks = self.tasks.lock();

        // ── Memory sampler ──────────────────────────────────────
        let memory = self.memory.clone();
        let running = self.running.clone();
        let period = self.config.memory_sample_period;
        tasks.push(tokio::spawn(async move {
            let mut ticks = IntervalStream::new(tokio::time::interval(period));
            while ticks.next().await.is_some() {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                memory.sample();
            }
        }));

        // ── Periodic dump ───────────────────────────────────────
        let running = self.running.clone();
        let interval = self.config.dump_interval;
        let targets = self.dump_targets();
        tasks.push(tokio::spawn(async move {
            let mut ticks = IntervalStream::new(tokio::time::interval(interval));
            // the first tick fires immediately; skip it so the first dump
            // lands one full interval in
            ticks.next().await;
            while ticks.next().await.is_some() {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                targets.dump_all();
            }
        }));

        log::info!(
            "stats background tasks started (dump every {:?})",
            self.config.dump_interval
        );
    }

    /// Stop the background tasks and write a final dump.
    pub async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
            let _ = task.await;
        }
        self.dump_all();
    }

    /// Dump every domain now. A failure in one domain is logged and the
    /// others still run.
    pub fn dump_all(&self) {
        self.dump_targets().dump_all();
    }

    /// Full point-in-time view of every domain, serializable for embedders
    /// that ship stats over their own channel instead of (or besides) the
    /// report files.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frame_loop: self.frame_loop.report(),
            frame_encode: self.frame_encode.report(),
            event_loop: self.event_loop.report(),
            memory: self.memory.report(),
            network: self.network.report(),
        }
    }

    fn dump_targets(&self) -> DumpTargets {
        DumpTargets {
            output_dir: self.config.output_dir.clone(),
            frame_loop: self.frame_loop.clone(),
            event_loop: self.event_loop.clone(),
            memory: self.memory.clone(),
            network: self.network.clone(),
        }
    }
}

// ─── Snapshot ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub frame_loop: RecorderReport,
    pub frame_encode: RecorderReport,
    pub event_loop: RecorderReport,
    pub memory: Vec<MetricRow>,
    pub network: Vec<MetricRow>,
}

// ─── Dump plumbing ───────────────────────────────────────────────

/// Everything the periodic dump task needs, detached from the context's
/// lifetime. The encode recorder has no files of its own — its spans ride
/// inside the frame-loop plotting export.
struct DumpTargets {
    output_dir: PathBuf,
    frame_loop: Arc<Recorder>,
    event_loop: Arc<Recorder>,
    memory: Arc<MemoryMonitor>,
    network: Arc<NetworkMonitor>,
}

impl DumpTargets {
    fn dump_all(&self) {
        let dir = &self.output_dir;
        let results = [
            (
                "frame loop",
                export::dump_recorder(
                    dir,
                    &self.frame_loop,
                    export::FRAME_METRICS_FILE,
                    export::FRAME_PLOTTING_FILE,
                ),
            ),
            (
                "event loop",
                export::dump_recorder(
                    dir,
                    &self.event_loop,
                    export::EVENT_METRICS_FILE,
                    export::EVENT_PLOTTING_FILE,
                ),
            ),
            ("memory", export::dump_memory(dir, &self.memory)),
            ("network", export::dump_network(dir, &self.network)),
        ];
        for (domain, result) in results {
            if let Err(err) = result {
                log::warn!("skipping {domain} stats dump: {err}");
            }
        }
        log::debug!("stats dump written to {}", dir.display());
    }
}

// ─── Metric batteries ────────────────────────────────────────────
//
// Each recorder carries an average-case view plus several burst and tail
// punishment views of the same duration stream at different sensitivities.

fn frame_loop_metrics() -> Vec<Metric> {
    vec![
        Metric::Average(Average::new()),
        Metric::Average(Average::with_objects_threshold(1)),
        Metric::PeakRate(PeakRate::new(1)),
        Metric::PeakRate(PeakRate::new(3)),
        Metric::PeakRate(PeakRate::new(5)),
        Metric::PeakRate(PeakRate::new(10)),
        Metric::PeakRate(PeakRate::new(20)),
        Metric::PeakRate(PeakRate::with_order(3, 2)),
        Metric::PeakRate(PeakRate::with_order(5, 2)),
        Metric::PeakRate(PeakRate::with_order(3, 3)),
        Metric::PeakRate(PeakRate::with_order(5, 3)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.2, 3)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.2, 5)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.5, 5)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(2.0, 5)),
    ]
}

fn event_loop_metrics() -> Vec<Metric> {
    vec![
        Metric::Average(Average::new()),
        Metric::EventFrequency(EventFrequency::new(10)),
        Metric::EventFrequency(EventFrequency::new(50)),
        Metric::PeakRate(PeakRate::new(1)),
        Metric::PeakRate(PeakRate::new(3)),
        Metric::PeakRate(PeakRate::new(5)),
        Metric::PeakRate(PeakRate::new(10)),
        Metric::PeakRate(PeakRate::new(20)),
        Metric::PeakRate(PeakRate::new(40)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.2, 3)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.2, 5)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.5, 5)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(2.0, 5)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.5, 15)),
        Metric::PowerPunishingRate(PowerPunishingRate::new(1.5, 30)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> StatsConfig {
        StatsConfig {
            output_dir: dir.to_path_buf(),
            ..StatsConfig::default()
        }
    }

    #[test]
    fn unusable_output_dir_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("not-a-dir");
        std::fs::write(&file_path, "x").unwrap();

        let err = StatsContext::new(test_config(&file_path)).unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[test]
    fn contexts_are_isolated() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let a = StatsContext::new(test_config(dir_a.path())).unwrap();
        let b = StatsContext::new(test_config(dir_b.path())).unwrap();

        a.network.add(1, 4096);
        assert_eq!(a.network.packets().len(), 1);
        assert!(b.network.packets().is_empty());
    }

    #[test]
    fn snapshot_covers_every_domain() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = StatsContext::new(test_config(dir.path())).unwrap();
        ctx.frame_loop.start_measurement();
        ctx.frame_loop.end_measurement();

        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.frame_loop.block_name, "frame update loop");
        assert!(!snapshot.frame_loop.rows.is_empty());
        assert_eq!(snapshot.network.len(), 2);
        // snapshots serialize for embedders
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("frame update loop"));
    }
}
