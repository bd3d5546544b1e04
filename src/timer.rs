use std::time::{Duration, Instant};

/// Stop-watch reporting the mean of its laps, refreshed once per window.
#[derive(Clone, Debug)]
pub struct AveragingTimer {
    window: Duration,
    window_start: Instant,
    lap_start: Option<Instant>,
    total: Duration,
    laps: u32,
    last: Duration,
}

impl AveragingTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            lap_start: None,
            total: Duration::ZERO,
            laps: 0,
            last: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        self.lap_start = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(start) = self.lap_start.take() {
            self.record(start.elapsed());
        }
    }

    pub fn record(&mut self, lap: Duration) {
        self.record_at(lap, Instant::now());
    }

    fn record_at(&mut self, lap: Duration, now: Instant) {
        self.total += lap;
        self.laps += 1;
        if now.duration_since(self.window_start) >= self.window {
            self.last = self.total / self.laps;
            self.window_start = now;
            self.total = Duration::ZERO;
            self.laps = 0;
        }
    }

    /// Mean lap of the last completed window.
    pub fn average(&self) -> Duration {
        self.last
    }
}
