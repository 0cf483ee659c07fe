//! Active capture: frames being appended during an in-progress recording

use crate::frame::{Frame, FrameKind, Recording};
use glam::Vec2;
use stride_core::pool::{Pool, PoolStats};
use stride_core::ring::BoundedRing;
use tracing::trace;

/// Movement samples closer than this to the last recorded one are dropped.
pub const MIN_DIRECTION_DELTA: f32 = 0.001;

/// Absolute slack on the sample-interval check, in seconds.
const INTERVAL_SLACK: f32 = 1e-4;

/// Rounding allowance for comparing two f32 clock readings near `now`.
fn interval_slack(now: f32) -> f32 {
    INTERVAL_SLACK.max(now.abs() * f32::EPSILON * 4.0)
}

/// Bounded frame ring fed from a recycling pool.
///
/// Frames leave the pool on append and go back when evicted from the ring or
/// when the ring is drained by [`Capture::seal`].
pub struct Capture {
    ring: BoundedRing<Frame>,
    pool: Pool<Frame>,
    sample_interval: f32,
    start_time: f32,
    last_sample_time: f32,
    last_direction: Vec2,
    sequence: u32,
}

impl Capture {
    pub fn new(buffer_size: usize, sample_interval: f32, pool_capacity: usize) -> Self {
        Self {
            ring: BoundedRing::new(buffer_size),
            pool: Pool::with_capacity(pool_capacity),
            sample_interval,
            start_time: 0.0,
            last_sample_time: 0.0,
            last_direction: Vec2::ZERO,
            sequence: 0,
        }
    }

    pub fn prewarm(&mut self, count: usize) {
        self.pool.prewarm(count);
    }

    /// Apply new limits. Any frames still in the ring are recycled first.
    pub fn reconfigure(&mut self, buffer_size: usize, sample_interval: f32, pool_capacity: usize) {
        self.recycle_all();
        if self.ring.bound() != buffer_size.max(1) {
            self.ring = BoundedRing::new(buffer_size);
        }
        self.sample_interval = sample_interval;
        self.pool.set_capacity(pool_capacity);
    }

    /// Release any leftover frames and restart the clock at `now`.
    pub fn begin(&mut self, now: f32) {
        self.recycle_all();
        self.start_time = now;
        self.last_sample_time = now;
        self.last_direction = Vec2::ZERO;
        self.sequence = 0;
    }

    pub fn start_time(&self) -> f32 {
        self.start_time
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.ring.iter()
    }

    /// Append a movement sample if the sample interval has elapsed and the
    /// direction moved far enough. Returns whether it was stored.
    pub fn offer_movement(&mut self, direction: Vec2, now: f32) -> bool {
        if now - self.last_sample_time + interval_slack(now) < self.sample_interval {
            return false;
        }
        if direction.distance(self.last_direction) < MIN_DIRECTION_DELTA {
            return false;
        }
        self.append(FrameKind::Movement, direction, now);
        self.last_direction = direction;
        self.last_sample_time = now;
        true
    }

    /// Edges bypass both sampling filters.
    pub fn push_edge(&mut self, kind: FrameKind, now: f32) {
        self.append(kind, Vec2::ZERO, now);
    }

    fn append(&mut self, kind: FrameKind, direction: Vec2, now: f32) {
        let mut frame = self.pool.acquire();
        frame.kind = kind;
        frame.direction = direction;
        frame.timestamp = now - self.start_time;
        frame.sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        trace!(?kind, timestamp = frame.timestamp, "frame captured");
        if let Some(evicted) = self.ring.push(frame) {
            self.pool.release(evicted);
        }
    }

    /// Copy the ring into a sealed recording and hand the frames back to the
    /// pool.
    pub fn seal(&mut self, name: String, now: f32) -> Recording {
        let frames: Vec<Frame> = self.ring.iter().cloned().collect();
        self.recycle_all();
        Recording::seal(name, now - self.start_time, frames)
    }

    fn recycle_all(&mut self) {
        for frame in self.ring.drain() {
            self.pool.release(frame);
        }
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: f32 = 1.0 / 60.0;

    #[test]
    fn identical_samples_are_stored_once() {
        let mut capture = Capture::new(10_000, INTERVAL, 200);
        capture.begin(0.0);
        capture.push_edge(FrameKind::InputStart, 0.0);

        for tick in 1..=100 {
            capture.offer_movement(Vec2::new(1.0, 0.0), tick as f32 * INTERVAL);
        }

        let movement = capture
            .frames()
            .filter(|f| f.kind == FrameKind::Movement)
            .count();
        assert_eq!(movement, 1);
        assert_eq!(capture.len(), 2);
    }

    #[test]
    fn one_sample_per_tick_at_matching_rate() {
        let mut capture = Capture::new(10_000, INTERVAL, 200);
        for start in [0u64, 60 * 60 * 60] {
            capture.begin((start as f64 / 60.0) as f32);
            for tick in 1..=600u64 {
                let now = ((start + tick) as f64 / 60.0) as f32;
                let direction = Vec2::new(tick as f32 * 0.01, 0.0);
                assert!(capture.offer_movement(direction, now), "tick {tick} after {start}");
            }
            assert_eq!(capture.len(), 600);
            capture.seal("rate".into(), ((start + 600) as f64 / 60.0) as f32);
        }
    }

    #[test]
    fn samples_faster_than_the_rate_are_dropped() {
        let mut capture = Capture::new(100, INTERVAL, 10);
        capture.begin(0.0);
        assert!(capture.offer_movement(Vec2::X, 0.02));
        assert!(!capture.offer_movement(Vec2::Y, 0.03));
        assert!(capture.offer_movement(Vec2::Y, 0.02 + INTERVAL));
    }

    #[test]
    fn ring_evicts_oldest_first() {
        let mut capture = Capture::new(5, 0.0, 16);
        capture.begin(0.0);
        for i in 0..12 {
            capture.offer_movement(Vec2::new(i as f32, 0.0), i as f32);
        }

        assert_eq!(capture.len(), 5);
        let sequences: Vec<u32> = capture.frames().map(|f| f.sequence).collect();
        assert_eq!(sequences, vec![6, 7, 8, 9, 10]);
        // Sample 0 equals the initial direction and is filtered.
        assert_eq!(capture.pool_stats().recycled, 6);
    }

    #[test]
    fn seal_recycles_frames_within_pool_capacity() {
        let mut capture = Capture::new(100, 0.0, 4);
        capture.begin(0.0);
        for i in 1..=10 {
            capture.offer_movement(Vec2::new(i as f32, 0.0), i as f32 * 0.1);
        }
        let recording = capture.seal("cap".into(), 2.0);

        assert_eq!(recording.frame_count(), 10);
        assert!(capture.is_empty());
        let stats = capture.pool_stats();
        assert_eq!(stats.free, 4);
        assert_eq!(stats.dropped, 6);

        capture.begin(3.0);
        capture.offer_movement(Vec2::X, 4.0);
        assert_eq!(capture.pool_stats().reused, 1);
    }

    #[test]
    fn timestamps_are_relative_to_begin() {
        let mut capture = Capture::new(10, INTERVAL, 10);
        capture.begin(5.0);
        capture.push_edge(FrameKind::InputStart, 5.0);
        assert!(capture.offer_movement(Vec2::Y, 5.5));
        let recording = capture.seal("rel".into(), 6.0);

        let stamps: Vec<f32> = recording.frames().iter().map(|f| f.timestamp).collect();
        assert_eq!(stamps, vec![0.0, 0.5]);
        assert_eq!(recording.duration(), 1.0);
    }
}
