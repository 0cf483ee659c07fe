//! Fixed tick cost tracking

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Measures how long each fixed tick takes against its time budget.
pub struct TickTimer {
    tick_start: Instant,
    budget: Duration,
    tick_times: RingBuffer<Duration>,
    over_budget: u64,
}

impl TickTimer {
    pub fn new(capacity: usize, budget: Duration) -> Self {
        Self {
            tick_start: Instant::now(),
            budget,
            tick_times: RingBuffer::new(capacity),
            over_budget: 0,
        }
    }

    pub fn begin(&mut self) {
        self.tick_start = Instant::now();
    }

    pub fn end(&mut self) {
        let elapsed = self.tick_start.elapsed();
        if elapsed > self.budget {
            self.over_budget += 1;
        }
        self.tick_times.push(elapsed);
    }

    pub fn average_ms(&self) -> f64 {
        self.tick_times.average().as_secs_f64() * 1000.0
    }

    pub fn worst_ms(&self) -> f64 {
        self.tick_times.max().as_secs_f64() * 1000.0
    }

    /// Ticks that took longer than the fixed interval.
    pub fn over_budget(&self) -> u64 {
        self.over_budget
    }
}
