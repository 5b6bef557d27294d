use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::System;

use crate::clock::EpochClock;
use crate::metrics::{Average, MetricRow};

const BYTES_PER_MB: u64 = 1024 * 1024;

// ─── Samples ─────────────────────────────────────────────────────

/// One polled memory reading. Timestamp in ms since the process epoch,
/// sizes in bytes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemoryUsage {
    pub timestamp_ms: u64,
    pub total: u64,
    pub used: u64,
}

impl MemoryUsage {
    /// Two plotting rows per reading — used then total, in megabytes.
    pub(crate) fn csv_rows(&self) -> String {
        format!(
            "{},Used,{}\n{},Total,{}\n",
            self.timestamp_ms,
            self.used / BYTES_PER_MB,
            self.timestamp_ms,
            self.total / BYTES_PER_MB,
        )
    }
}

// ─── Monitor ─────────────────────────────────────────────────────

/// Polls memory on a fixed period, keeps every reading for the plotting
/// export, and folds used bytes into a running average.
pub struct MemoryMonitor {
    clock: EpochClock,
    state: Mutex<State>,
}

struct State {
    sys: System,
    usages: Vec<MemoryUsage>,
    average_used: Average,
}

impl MemoryMonitor {
    pub fn new(clock: EpochClock) -> Self {
        Self {
            clock,
            state: Mutex::new(State {
                sys: System::new(),
                usages: Vec::new(),
                average_used: Average::new(),
            }),
        }
    }

    /// Take one reading. The background sampler calls this once per period.
    pub fn sample(&self) {
        let now = self.clock.timestamp_ms();
        let mut state = self.state.lock();
        state.sys.refresh_memory();
        let usage = MemoryUsage {
            timestamp_ms: now,
            total: state.sys.total_memory(),
            used: state.sys.used_memory(),
        };
        state.average_used.add(usage.used, 1);
        state.usages.push(usage);
    }

    pub fn report(&self) -> Vec<MetricRow> {
        let state = self.state.lock();
        vec![MetricRow {
            name: "Average used memory".into(),
            params: String::new(),
            unit: "Mb".into(),
            value: state.average_used.result() / BYTES_PER_MB,
        }]
    }

    /// Snapshot of every reading taken so far.
    pub fn usages(&self) -> Vec<MemoryUsage> {
        self.state.lock().usages.clone()
    }
}
