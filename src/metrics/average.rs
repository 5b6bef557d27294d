use super::MetricRow;

/// Running arithmetic mean of the observed values, optionally ignoring
/// observations whose processed-object count falls below a threshold (a
/// frame that touched nothing is not an interesting data point).
#[derive(Debug, Clone, Default)]
pub struct Average {
    objects_threshold: u32,
    total: u64,
    count: u64,
}

impl Average {
    pub fn new() -> Self {
        Self::with_objects_threshold(0)
    }

    pub fn with_objects_threshold(objects_threshold: u32) -> Self {
        Self {
            objects_threshold,
            total: 0,
            count: 0,
        }
    }

    pub fn add(&mut self, value: u64, processed_objects: u32) {
        if processed_objects < self.objects_threshold {
            return;
        }
        self.total += value;
        self.count += 1;
    }

    /// Mean of the accepted observations; zero before the first one.
    pub fn result(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.total / self.count
        }
    }

    /// Sum of the accepted values. The network throughput report divides
    /// this by elapsed time rather than by the observation count.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn row(&self) -> MetricRow {
        MetricRow {
            name: "Average".into(),
            params: format!("Objects threshold={}", self.objects_threshold),
            unit: "ms".into(),
            value: self.result(),
        }
    }
}
