use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::EpochClock;
use crate::measure::{Measurement, Sample, Span};
use crate::metrics::{Metric, MetricRow};

// ─── Configuration ───────────────────────────────────────────────

/// HdrHistogram range: 1 ms → 1 hour, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 3_600_000;
const HIST_SIGFIG: u8 = 3;

// ─── Recorder ────────────────────────────────────────────────────

/// A named timing context. Callers bracket a recurring work unit with
/// `start_measurement` / `end_measurement`; every completed duration feeds
/// the configured metric battery and a latency histogram, and spans longer
/// than the retention threshold are kept for the plotting export.
///
/// All scratch state and the accumulators sit behind one mutex, so
/// concurrent completions from different threads are serialized; the
/// retained-spans log has its own lock.
pub struct Recorder {
    block_name: String,
    clock: EpochClock,
    inner: Mutex<Inner>,
    retention: Option<Retention>,
}

struct Inner {
    current_start: u64,
    pending_children: Vec<Measurement>,
    metrics: Vec<Metric>,
    hist: Histogram<u64>,
}

struct Retention {
    threshold_ms: u64,
    spans: Mutex<Vec<Measurement>>,
}

impl Recorder {
    pub fn new(block_name: impl Into<String>, clock: EpochClock, metrics: Vec<Metric>) -> Self {
        Self {
            block_name: block_name.into(),
            clock,
            inner: Mutex::new(Inner {
                current_start: 0,
                pending_children: Vec::new(),
                metrics,
                hist: Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
                    .expect("histogram creation"),
            }),
            retention: None,
        }
    }

    /// Additionally retain completed spans longer than `threshold_ms`.
    pub fn with_retention(mut self, threshold_ms: u64) -> Self {
        self.retention = Some(Retention {
            threshold_ms,
            spans: Mutex::new(Vec::new()),
        });
        self
    }

    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    /// Open a measurement; the next `end_measurement` closes it.
    pub fn start_measurement(&self) {
        let now = self.clock.timestamp_ms();
        self.inner.lock().current_start = now;
    }

    /// Close the current measurement assuming one processed object.
    pub fn end_measurement(&self) -> Measurement {
        self.end_measurement_with(1)
    }

    /// Close the current measurement: feed `(duration, processed_objects)`
    /// into every metric and the histogram, build the span from the pending
    /// children (clearing them), and retain it when it is long enough to be
    /// interesting.
    pub fn end_measurement_with(&self, processed_objects: u32) -> Measurement {
        let end = self.clock.timestamp_ms();
        let span = {
            let mut inner = self.inner.lock();
            let start = inner.current_start;
            let duration = end.saturating_sub(start);
            for metric in inner.metrics.iter_mut() {
                metric.add(end, duration, processed_objects);
            }
            let _ = inner.hist.record(duration.max(1));
            Span {
                name: self.block_name.clone(),
                start_ms: start,
                end_ms: end,
                children: std::mem::take(&mut inner.pending_children),
            }
        };
        let measurement = Measurement::Span(span);
        if let Some(retention) = &self.retention {
            if measurement.duration_ms() > retention.threshold_ms {
                retention.spans.lock().push(measurement.clone());
            }
        }
        measurement
    }

    /// Time `block` as a leaf sample inside the currently open measurement.
    /// Runs the closure exactly once, synchronously, and returns its value.
    /// The lock is not held while the closure runs.
    pub fn simple_measure<T>(&self, name: impl Into<String>, block: impl FnOnce() -> T) -> T {
        let start = self.clock.timestamp_ms();
        let result = block();
        let end = self.clock.timestamp_ms();
        self.inner
            .lock()
            .pending_children
            .push(Measurement::Sample(Sample {
                name: name.into(),
                start_ms: start,
                end_ms: end,
            }));
        result
    }

    /// Time `block` as a measurement of its own with a single leaf.
    pub fn standalone_simple_measure<T>(
        &self,
        name: impl Into<String>,
        block: impl FnOnce() -> T,
    ) -> T {
        self.start_measurement();
        let result = self.simple_measure(name, block);
        self.end_measurement();
        result
    }

    /// Attach an externally completed measurement (typically a child
    /// recorder's span) to the currently open one.
    pub fn add_measurement(&self, measurement: Measurement) {
        self.inner.lock().pending_children.push(measurement);
    }

    /// Metric battery plus latency percentiles, rendered as report rows.
    pub fn report(&self) -> RecorderReport {
        let now = self.clock.timestamp_ms();
        let inner = self.inner.lock();
        let mut rows: Vec<MetricRow> = inner.metrics.iter().map(|m| m.row(now)).collect();
        rows.extend(percentile_rows(&inner.hist));
        RecorderReport {
            block_name: self.block_name.clone(),
            rows,
        }
    }

    /// Total number of completed measurements.
    pub fn completed_measurements(&self) -> u64 {
        self.inner.lock().hist.len()
    }

    /// Snapshot of the retained over-threshold spans; empty when retention
    /// is disabled.
    pub fn retained_spans(&self) -> Vec<Measurement> {
        match &self.retention {
            Some(retention) => retention.spans.lock().clone(),
            None => Vec::new(),
        }
    }
}

// ─── Reports ─────────────────────────────────────────────────────

/// Point-in-time view of one recorder, serializable for embedders.
#[derive(Debug, Clone, Serialize)]
pub struct RecorderReport {
    pub block_name: String,
    pub rows: Vec<MetricRow>,
}

fn percentile_rows(hist: &Histogram<u64>) -> Vec<MetricRow> {
    if hist.len() == 0 {
        return Vec::new();
    }
    let row = |name: &str, value: u64| MetricRow {
        name: name.into(),
        params: String::new(),
        unit: "ms".into(),
        value,
    };
    vec![
        row("Latency min", hist.min()),
        row("Latency mean", hist.mean().round() as u64),
        row("Latency p50", hist.value_at_percentile(50.0)),
        row("Latency p95", hist.value_at_percentile(95.0)),
        row("Latency p99", hist.value_at_percentile(99.0)),
        row("Latency max", hist.max()),
    ]
}
