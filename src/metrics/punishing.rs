use super::MetricRow;

/// Convexity-weighted stall penalty. Durations at or above the time
/// threshold contribute `round(duration^power)` to a running total, shorter
/// ones contribute nothing, and the total is normalized by elapsed process
/// time. A rare 100 ms stall therefore costs far more than many 5 ms ones.
#[derive(Debug, Clone)]
pub struct PowerPunishingRate {
    power: f64,
    threshold_ms: u64,
    objects_threshold: u32,
    total: u64,
}

impl PowerPunishingRate {
    pub fn new(power: f64, threshold_ms: u64) -> Self {
        Self::with_objects_threshold(power, threshold_ms, 0)
    }

    pub fn with_objects_threshold(power: f64, threshold_ms: u64, objects_threshold: u32) -> Self {
        Self {
            power,
            threshold_ms,
            objects_threshold,
            total: 0,
        }
    }

    fn error_function(&self, duration_ms: u64, processed_objects: u32) -> u64 {
        if duration_ms < self.threshold_ms || processed_objects < self.objects_threshold {
            return 0;
        }
        (duration_ms as f64).powf(self.power).round() as u64
    }

    pub fn add(&mut self, duration_ms: u64, processed_objects: u32) {
        self.total += self.error_function(duration_ms, processed_objects);
    }

    /// Accumulated penalty so far; monotonically non-decreasing.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Penalty per second of elapsed process time, zero-guarded.
    pub fn result(&self, now_ms: u64) -> u64 {
        if now_ms == 0 {
            0
        } else {
            self.total * 1000 / now_ms
        }
    }

    pub(crate) fn row(&self, now_ms: u64) -> MetricRow {
        MetricRow {
            name: "Power punishing rate".into(),
            params: format!(
                "Power={};Time threshold={};Objects threshold={}",
                self.power, self.threshold_ms, self.objects_threshold
            ),
            unit: format!("(ms)^{}/second", self.power),
            value: self.result(now_ms),
        }
    }
}
