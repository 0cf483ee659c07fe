//! Deterministic time system
//!
//! Fixed-rate tick (60 Hz by default) with an accumulator for driving the
//! tick from variable wall-clock frames.

use std::time::Duration;

/// Default simulation tick rate (60 Hz = 16.666ms per tick)
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// Simulation time tracker
///
/// Time only advances in whole ticks, so every consumer that reads
/// [`SimulationTime::elapsed_secs`] during a tick sees the same value.
#[derive(Debug, Clone)]
pub struct SimulationTime {
    tick_rate_hz: u32,
    tick_duration: Duration,
    tick_count: u64,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self::with_rate(DEFAULT_TICK_RATE_HZ)
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        let tick_rate_hz = tick_rate_hz.max(1);
        Self {
            tick_rate_hz,
            tick_duration: Duration::from_secs_f64(1.0 / tick_rate_hz as f64),
            tick_count: 0,
        }
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Fixed delta time in seconds.
    pub fn delta_secs(&self) -> f32 {
        self.tick_duration.as_secs_f32()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
    }

    /// Seconds since the first tick, computed from the tick count so it does
    /// not drift with accumulated float error.
    pub fn elapsed_secs(&self) -> f32 {
        (self.tick_count as f64 / self.tick_rate_hz as f64) as f32
    }

    pub fn reset(&mut self) {
        self.tick_count = 0;
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts variable frame times into a whole number of fixed ticks.
#[derive(Debug, Clone)]
pub struct FixedStepper {
    tick: Duration,
    accumulator: Duration,
    max_steps_per_frame: u32,
}

impl FixedStepper {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            accumulator: Duration::ZERO,
            max_steps_per_frame: 8,
        }
    }

    /// Caps catch-up work after a long stall (spiral-of-death guard).
    pub fn with_max_steps(mut self, max_steps_per_frame: u32) -> Self {
        self.max_steps_per_frame = max_steps_per_frame.max(1);
        self
    }

    /// Add a frame's worth of wall time and return how many ticks to run.
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        if self.tick.is_zero() {
            return 0;
        }
        self.accumulator += frame_time;
        let mut steps = 0;
        while self.accumulator >= self.tick && steps < self.max_steps_per_frame {
            self.accumulator -= self.tick;
            steps += 1;
        }
        if steps == self.max_steps_per_frame {
            // Drop the backlog we refused to simulate.
            self.accumulator = Duration::ZERO;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_follows_tick_count() {
        let mut time = SimulationTime::with_rate(50);
        for _ in 0..25 {
            time.advance_tick();
        }
        assert_eq!(time.tick_count(), 25);
        assert!((time.elapsed_secs() - 0.5).abs() < 1e-6);
        assert!((time.delta_secs() - 0.02).abs() < 1e-6);

        time.reset();
        assert_eq!(time.elapsed_secs(), 0.0);
    }

    #[test]
    fn zero_rate_is_clamped() {
        let time = SimulationTime::with_rate(0);
        assert_eq!(time.tick_rate_hz(), 1);
    }

    #[test]
    fn stepper_accumulates_partial_frames() {
        let mut stepper = FixedStepper::new(Duration::from_millis(10));
        assert_eq!(stepper.advance(Duration::from_millis(4)), 0);
        assert_eq!(stepper.advance(Duration::from_millis(7)), 1);
        assert_eq!(stepper.advance(Duration::from_millis(25)), 2);
    }

    #[test]
    fn stepper_drops_backlog_past_the_cap() {
        let mut stepper = FixedStepper::new(Duration::from_millis(10)).with_max_steps(3);
        assert_eq!(stepper.advance(Duration::from_secs(1)), 3);
        assert_eq!(stepper.advance(Duration::ZERO), 0);
    }
}
