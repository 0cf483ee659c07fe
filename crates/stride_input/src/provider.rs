//! Fixed-tick directional input provider
//!
//! Each tick runs the same pipeline: read keys, scale by sensitivity, apply
//! the dead zone, optionally clamp to eight directions, smooth toward the
//! result, then compare activity against the previous tick to find edges.

use crate::config::InputConfig;
use crate::events::{Edge, InputEvent};
use crate::keys::{DirectionalKeys, KeySource};
use glam::Vec2;
use stride_core::math::SmoothDamp;
use tracing::{debug, error};

/// Smoothed magnitude above which input counts as active.
pub const ACTIVITY_THRESHOLD: f32 = 0.01;

/// Direction vector with its polar form, recomputed each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DirectionSample {
    pub vector: Vec2,
    pub magnitude: f32,
    /// Radians counter-clockwise from +x.
    pub angle: f32,
}

impl DirectionSample {
    pub fn new(vector: Vec2) -> Self {
        Self {
            vector,
            magnitude: vector.length(),
            angle: vector.y.atan2(vector.x),
        }
    }
}

/// `(right - left, forward - back) * sensitivity`
pub fn raw_direction(keys: DirectionalKeys, sensitivity: f32) -> Vec2 {
    keys.axis() * sensitivity
}

pub fn apply_dead_zone(input: Vec2, threshold: f32) -> Vec2 {
    if input.length() < threshold {
        Vec2::ZERO
    } else {
        input
    }
}

/// Diagonals are not allowed to exceed straight-input magnitude.
pub fn clamp_eight_directional(input: Vec2) -> Vec2 {
    if input.length() > 1.0 {
        input.normalize()
    } else {
        input
    }
}

/// Run the filter chain in its fixed order: sensitivity, dead zone, clamp.
pub fn filter_direction(keys: DirectionalKeys, config: &InputConfig) -> Vec2 {
    let scaled = raw_direction(keys, config.sensitivity());
    let filtered = apply_dead_zone(scaled, config.dead_zone());
    if config.eight_directional {
        clamp_eight_directional(filtered)
    } else {
        filtered
    }
}

/// Notifications produced by a single provider tick.
///
/// At most one edge fires per tick. `Started` precedes the movement value
/// of the same tick; `Ended` never carries one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickEvents {
    pub edge: Option<Edge>,
    pub movement: Option<Vec2>,
}

impl TickEvents {
    pub fn is_empty(&self) -> bool {
        self.edge.is_none() && self.movement.is_none()
    }

    /// Events in emission order.
    pub fn iter(&self) -> impl Iterator<Item = InputEvent> {
        self.edge
            .map(InputEvent::from)
            .into_iter()
            .chain(self.movement.map(InputEvent::Movement))
    }
}

pub struct InputProvider {
    config: Option<InputConfig>,
    enabled: bool,
    raw: Vec2,
    smoothed: Vec2,
    smoothing_velocity: Vec2,
    was_active: bool,
    reported_missing_config: bool,
}

impl InputProvider {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::unconfigured()
        }
    }

    /// A provider that refuses to sample until [`InputProvider::set_config`].
    pub fn unconfigured() -> Self {
        Self {
            config: None,
            enabled: true,
            raw: Vec2::ZERO,
            smoothed: Vec2::ZERO,
            smoothing_velocity: Vec2::ZERO,
            was_active: false,
            reported_missing_config: false,
        }
    }

    pub fn config(&self) -> Option<&InputConfig> {
        self.config.as_ref()
    }

    /// Swap configuration and re-initialize.
    pub fn set_config(&mut self, config: InputConfig) {
        self.config = Some(config);
        self.reported_missing_config = false;
        self.initialize();
    }

    /// Zero raw and smoothed state and forget the activity flag. No
    /// `Ended` notification is emitted for an interrupted input.
    pub fn initialize(&mut self) {
        self.raw = Vec2::ZERO;
        self.smoothed = Vec2::ZERO;
        self.smoothing_velocity = Vec2::ZERO;
        self.was_active = false;
        debug!("input provider initialized");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Smoothed direction after the most recent tick.
    pub fn current_input(&self) -> Vec2 {
        self.smoothed
    }

    /// Filtered, unsmoothed direction after the most recent tick.
    pub fn raw_input(&self) -> Vec2 {
        self.raw
    }

    pub fn sample(&self) -> DirectionSample {
        DirectionSample::new(self.smoothed)
    }

    pub fn is_active(&self) -> bool {
        self.was_active
    }

    /// Advance one fixed tick of `dt` seconds.
    pub fn tick(&mut self, keys: &impl KeySource, dt: f32) -> TickEvents {
        if !self.enabled {
            return TickEvents::default();
        }
        let Some(config) = self.config.as_ref() else {
            if !self.reported_missing_config {
                error!("input provider has no configuration; sampling skipped");
                self.reported_missing_config = true;
            }
            return TickEvents::default();
        };

        let keys = keys.directional_keys(&config.bindings);
        self.raw = filter_direction(keys, config);

        self.smoothed = if config.smooth_time() > 0.0 {
            self.smoothed.smooth_damp(
                self.raw,
                &mut self.smoothing_velocity,
                config.smooth_time(),
                f32::INFINITY,
                dt,
            )
        } else {
            self.raw
        };

        self.detect_edges()
    }

    fn detect_edges(&mut self) -> TickEvents {
        let active = self.smoothed.length() > ACTIVITY_THRESHOLD;
        let edge = match (self.was_active, active) {
            (false, true) => Some(Edge::Started),
            (true, false) => Some(Edge::Ended),
            _ => None,
        };
        self.was_active = active;

        TickEvents {
            edge,
            movement: active.then_some(self.smoothed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn instant_config() -> InputConfig {
        InputConfig::default().with_smooth_time(0.0)
    }

    #[test]
    fn dead_zone_zeroes_small_input() {
        assert_eq!(apply_dead_zone(Vec2::new(0.05, 0.0), 0.1), Vec2::ZERO);
        assert_eq!(apply_dead_zone(Vec2::new(0.0, -0.09), 0.1), Vec2::ZERO);
        assert_eq!(apply_dead_zone(Vec2::new(0.2, 0.0), 0.1), Vec2::new(0.2, 0.0));
    }

    #[test]
    fn eight_directional_clamp_normalizes_diagonals() {
        let unit = clamp_eight_directional(Vec2::new(0.6, 0.8));
        assert!((unit - Vec2::new(0.6, 0.8)).length() < 1e-6);

        let diagonal = clamp_eight_directional(Vec2::new(1.0, 1.0));
        assert!((diagonal.length() - 1.0).abs() < 1e-6);
        assert!((diagonal.x - 0.707_106_8).abs() < 1e-5);
        assert!((diagonal.y - 0.707_106_8).abs() < 1e-5);

        for (x, y) in [(3.0, 0.0), (-2.0, 2.0), (1.5, -0.2)] {
            let out = clamp_eight_directional(Vec2::new(x, y));
            assert!((out.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn sensitivity_scales_before_the_dead_zone() {
        let config = instant_config()
            .with_sensitivity(0.5)
            .with_dead_zone(0.5)
            .with_eight_directional(false);
        // 1.0 * 0.5 = 0.5, not below the 0.5 threshold.
        assert_eq!(
            filter_direction(DirectionalKeys::right(), &config),
            Vec2::new(0.5, 0.0)
        );

        let config = config.with_sensitivity(3.0);
        let diagonal = DirectionalKeys::forward().and(DirectionalKeys::left());
        let unclamped = filter_direction(diagonal, &config);
        assert!(unclamped.length() > 4.0);

        let clamped = filter_direction(diagonal, &config.with_eight_directional(true));
        assert!((clamped.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn start_and_end_fire_once_per_transition() {
        let mut provider = InputProvider::new(instant_config());

        let first = provider.tick(&DirectionalKeys::forward(), DT);
        assert_eq!(first.edge, Some(Edge::Started));
        assert_eq!(first.movement, Some(Vec2::new(0.0, 1.0)));
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            vec![InputEvent::Started, InputEvent::Movement(Vec2::new(0.0, 1.0))]
        );

        let held = provider.tick(&DirectionalKeys::forward(), DT);
        assert_eq!(held.edge, None);
        assert!(held.movement.is_some());

        let released = provider.tick(&DirectionalKeys::NONE, DT);
        assert_eq!(released.edge, Some(Edge::Ended));
        assert_eq!(released.movement, None);

        let idle = provider.tick(&DirectionalKeys::NONE, DT);
        assert!(idle.is_empty());
    }

    #[test]
    fn edge_counts_match_activity_transitions() {
        let mut provider = InputProvider::new(InputConfig::default());
        let pattern = [
            (0..20, DirectionalKeys::right()),
            (20..50, DirectionalKeys::NONE),
            (50..55, DirectionalKeys::left()),
            (55..90, DirectionalKeys::NONE),
            (90..120, DirectionalKeys::forward().and(DirectionalKeys::right())),
            (120..200, DirectionalKeys::NONE),
        ];

        let mut transitions = 0;
        let mut starts = 0;
        let mut ends = 0;
        let mut last_edge = None;
        let mut previous_active = false;

        for (range, keys) in pattern {
            for _ in range {
                let events = provider.tick(&keys, DT);
                if provider.is_active() != previous_active {
                    transitions += 1;
                }
                previous_active = provider.is_active();

                if let Some(edge) = events.edge {
                    assert_ne!(last_edge, Some(edge), "two {edge:?} edges in a row");
                    last_edge = Some(edge);
                    match edge {
                        Edge::Started => starts += 1,
                        Edge::Ended => ends += 1,
                    }
                }
            }
        }

        assert_eq!(starts, 3);
        assert_eq!(ends, 3);
        assert_eq!(starts + ends, transitions);
    }

    #[test]
    fn smoothing_ramps_toward_filtered_input() {
        let mut provider = InputProvider::new(InputConfig::default().with_smooth_time(0.2));
        provider.tick(&DirectionalKeys::right(), DT);
        let early = provider.current_input().x;
        assert!(early > 0.0 && early < 1.0);
        assert_eq!(provider.raw_input(), Vec2::new(1.0, 0.0));

        for _ in 0..120 {
            provider.tick(&DirectionalKeys::right(), DT);
        }
        assert!((provider.current_input().x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn disabled_provider_emits_nothing() {
        let mut provider = InputProvider::new(instant_config());
        provider.set_enabled(false);
        for _ in 0..10 {
            assert!(provider.tick(&DirectionalKeys::forward(), DT).is_empty());
        }
        assert_eq!(provider.current_input(), Vec2::ZERO);
    }

    #[test]
    fn unconfigured_provider_does_not_run() {
        let mut provider = InputProvider::unconfigured();
        assert!(provider.tick(&DirectionalKeys::forward(), DT).is_empty());

        provider.set_config(instant_config());
        assert_eq!(
            provider.tick(&DirectionalKeys::forward(), DT).edge,
            Some(Edge::Started)
        );
    }

    #[test]
    fn initialize_clears_activity_without_ending() {
        let mut provider = InputProvider::new(instant_config());
        provider.tick(&DirectionalKeys::forward(), DT);
        assert!(provider.is_active());

        provider.initialize();
        assert!(!provider.is_active());
        // Keys still released after reset: no stale Ended.
        assert!(provider.tick(&DirectionalKeys::NONE, DT).is_empty());
    }

    #[test]
    fn sample_reports_polar_form() {
        let sample = DirectionSample::new(Vec2::new(0.0, 2.0));
        assert_eq!(sample.magnitude, 2.0);
        assert!((sample.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
