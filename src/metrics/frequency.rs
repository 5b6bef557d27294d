use std::collections::VecDeque;

use super::MetricRow;

/// Events per second over a recent window: keeps the arrival timestamps of
/// the last `window_size` observations and divides their count by the time
/// elapsed since the oldest one.
#[derive(Debug, Clone)]
pub struct EventFrequency {
    window_size: usize,
    arrivals: VecDeque<u64>,
}

impl EventFrequency {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            arrivals: VecDeque::with_capacity(window_size + 1),
        }
    }

    pub fn add(&mut self, now_ms: u64) {
        self.arrivals.push_back(now_ms);
        if self.arrivals.len() > self.window_size {
            self.arrivals.pop_front();
        }
    }

    /// Recent event rate in events/second; zero before the first event or
    /// when no time has elapsed yet.
    pub fn result(&self, now_ms: u64) -> u64 {
        let oldest = match self.arrivals.front() {
            Some(&timestamp) => timestamp,
            None => return 0,
        };
        let elapsed_ms = now_ms.saturating_sub(oldest);
        if elapsed_ms == 0 {
            return 0;
        }
        self.arrivals.len() as u64 * 1000 / elapsed_ms
    }

    pub(crate) fn row(&self, now_ms: u64) -> MetricRow {
        MetricRow {
            name: "Event frequency".into(),
            params: format!("Window={}", self.window_size),
            unit: "events/second".into(),
            value: self.result(now_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_events_means_zero_rate() {
        assert_eq!(EventFrequency::new(10).result(500), 0);
    }

    #[test]
    fn rate_over_recent_arrivals() {
        let mut freq = EventFrequency::new(10);
        for arrival in [0, 100, 200] {
            freq.add(arrival);
        }
        // 3 events over 400 ms
        assert_eq!(freq.result(400), 3 * 1000 / 400);
    }

    #[test]
    fn window_drops_old_arrivals() {
        let mut freq = EventFrequency::new(2);
        freq.add(0);
        freq.add(100);
        freq.add(200);
        // the t=0 arrival fell out: 2 events since t=100
        assert_eq!(freq.result(300), 2 * 1000 / 200);
    }

    #[test]
    fn zero_elapsed_is_guarded() {
        let mut freq = EventFrequency::new(4);
        freq.add(50);
        assert_eq!(freq.result(50), 0);
    }
}
