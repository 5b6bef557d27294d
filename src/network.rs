use parking_lot::Mutex;
use serde::Serialize;

use crate::clock::EpochClock;
use crate::metrics::{Average, MetricRow};

// ─── Samples ─────────────────────────────────────────────────────

/// One outbound message, pushed by the transport layer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SentPacket {
    pub timestamp_ms: u64,
    pub byte_size: u64,
}

impl SentPacket {
    pub(crate) fn csv_row(&self) -> String {
        format!("{},{}\n", self.timestamp_ms, self.byte_size)
    }
}

// ─── Monitor ─────────────────────────────────────────────────────

/// Byte counter for the outbound connection: average packet size plus
/// average throughput since the first message went out.
pub struct NetworkMonitor {
    clock: EpochClock,
    state: Mutex<State>,
}

struct State {
    packets: Vec<SentPacket>,
    packet_sizes: Average,
    first_message_ms: Option<u64>,
}

impl NetworkMonitor {
    pub fn new(clock: EpochClock) -> Self {
        Self {
            clock,
            state: Mutex::new(State {
                packets: Vec::new(),
                packet_sizes: Average::new(),
                first_message_ms: None,
            }),
        }
    }

    /// Record one sent message. Called by the transport per outbound packet.
    pub fn add(&self, timestamp_ms: u64, byte_size: u64) {
        let mut state = self.state.lock();
        state.first_message_ms.get_or_insert(timestamp_ms);
        state.packet_sizes.add(byte_size, 1);
        state.packets.push(SentPacket {
            timestamp_ms,
            byte_size,
        });
    }

    pub fn report(&self) -> Vec<MetricRow> {
        self.report_at(self.clock.timestamp_ms())
    }

    fn report_at(&self, now_ms: u64) -> Vec<MetricRow> {
        let state = self.state.lock();
        // KB/s since the first message; zero until time has passed
        let throughput = match state.first_message_ms {
            Some(first_ms) if now_ms > first_ms => {
                state.packet_sizes.total() * 1000 / 1024 / (now_ms - first_ms)
            }
            _ => 0,
        };
        vec![
            MetricRow {
                name: "Average packet size".into(),
                params: String::new(),
                unit: "bytes".into(),
                value: state.packet_sizes.result(),
            },
            MetricRow {
                name: "Average network usage".into(),
                params: String::new(),
                unit: "Kb/second".into(),
                value: throughput,
            },
        ]
    }

    /// Snapshot of every packet recorded so far.
    pub fn packets(&self) -> Vec<SentPacket> {
        self.state.lock().packets.clone()
    }
}
