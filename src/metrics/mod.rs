pub mod average;
pub mod frequency;
pub mod peak;
pub mod punishing;

pub use average::Average;
pub use frequency::EventFrequency;
pub use peak::PeakRate;
pub use punishing::PowerPunishingRate;

use serde::Serialize;

/// Header line of every metrics report block.
pub const CSV_HEADER: &str = "Name,Params,Measurement Unit,Value";

// ─── Metric ──────────────────────────────────────────────────────

/// One streaming accumulator over a stream of (value, processed-objects)
/// observations. The set of kinds is fixed and known up front, so this is a
/// closed enum rather than an open trait hierarchy.
///
/// Accumulators are monotonic — observations are never retracted — and
/// `result` is a pure function of everything fed so far plus the supplied
/// clock reading.
#[derive(Debug, Clone)]
pub enum Metric {
    Average(Average),
    EventFrequency(EventFrequency),
    PeakRate(PeakRate),
    PowerPunishingRate(PowerPunishingRate),
}

impl Metric {
    /// Record one observation made at `now_ms`: a duration (or quantity)
    /// plus how many objects the measured block processed.
    pub fn add(&mut self, now_ms: u64, value: u64, processed_objects: u32) {
        match self {
            Metric::Average(m) => m.add(value, processed_objects),
            Metric::EventFrequency(m) => m.add(now_ms),
            Metric::PeakRate(m) => m.add(value),
            Metric::PowerPunishingRate(m) => m.add(value, processed_objects),
        }
    }

    /// Current scalar value. Division by zero is a defined edge case that
    /// reports as zero, never a panic.
    pub fn result(&self, now_ms: u64) -> u64 {
        match self {
            Metric::Average(m) => m.result(),
            Metric::EventFrequency(m) => m.result(now_ms),
            Metric::PeakRate(m) => m.result(now_ms),
            Metric::PowerPunishingRate(m) => m.result(now_ms),
        }
    }

    /// Render name, parameters, unit, and current value as one report row.
    pub fn row(&self, now_ms: u64) -> MetricRow {
        match self {
            Metric::Average(m) => m.row(),
            Metric::EventFrequency(m) => m.row(now_ms),
            Metric::PeakRate(m) => m.row(now_ms),
            Metric::PowerPunishingRate(m) => m.row(now_ms),
        }
    }
}

// ─── Report rows ─────────────────────────────────────────────────

/// One line of a metrics report: `name,params,unit,value`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRow {
    pub name: String,
    pub params: String,
    pub unit: String,
    pub value: u64,
}

impl MetricRow {
    pub fn csv_line(&self) -> String {
        format!("{},{},{},{}", self.name, self.params, self.unit, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_renders_in_header_order() {
        let row = MetricRow {
            name: "Average".into(),
            params: "Objects threshold=0".into(),
            unit: "ms".into(),
            value: 20,
        };
        assert_eq!(row.csv_line(), "Average,Objects threshold=0,ms,20");
        assert_eq!(
            CSV_HEADER.split(',').count(),
            row.csv_line().split(',').count()
        );
    }
}
