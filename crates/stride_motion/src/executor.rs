//! Movement executor
//!
//! Turns a per-tick 2D direction into a smoothed world-space velocity and
//! hands it to the configured backend.

use crate::backend::{BackendKind, GroundProbe, MovementBackend, PhysicsBody};
use crate::config::MovementConfig;
use glam::{Quat, Vec2, Vec3};
use stride_core::math::SmoothDamp;
use tracing::{debug, trace};

/// Input magnitude above which the entity counts as moving.
pub const MOVING_THRESHOLD: f32 = 0.01;
/// Velocities below this are not applied.
pub const MIN_APPLIED_SPEED: f32 = 0.001;
/// Ground probe starts this far above the entity origin.
pub const GROUND_PROBE_LIFT: f32 = 0.1;
pub const GROUND_PROBE_DISTANCE: f32 = 1.1;
/// Horizontal speed needed before the entity turns to face its motion.
const FACING_MIN_SPEED: f32 = 0.1;

/// Position and orientation. `+Z` is forward, `+X` is right, `+Y` is up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

/// Camera axes used for view-relative movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
    pub forward: Vec3,
    pub right: Vec3,
}

impl ViewBasis {
    /// Drop the vertical component of both axes and renormalize.
    pub fn flattened(forward: Vec3, right: Vec3) -> Self {
        let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        Self {
            forward: flat(forward),
            right: flat(right),
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self::flattened(rotation * Vec3::Z, rotation * Vec3::X)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementStats {
    pub is_moving: bool,
    pub current_speed: f32,
    pub target_speed: f32,
    pub is_grounded: bool,
    pub backend: BackendKind,
}

pub struct MovementExecutor {
    config: Option<MovementConfig>,
    backend: MovementBackend,
    transform: Transform,
    view: Option<ViewBasis>,
    ground: Option<Box<dyn GroundProbe>>,

    enabled: bool,
    input: Vec2,
    is_moving: bool,
    velocity: Vec3,
    target_velocity: Vec3,
    smoothing: Vec3,
    measured_velocity: Vec3,
    last_position: Vec3,
    is_grounded: bool,
}

impl MovementExecutor {
    pub fn new(config: MovementConfig, backend: MovementBackend) -> Self {
        let mut executor = Self::unconfigured(backend);
        executor.config = Some(config);
        executor
    }

    /// An executor that ignores input until it receives a configuration.
    pub fn unconfigured(backend: MovementBackend) -> Self {
        let position = backend.position().unwrap_or(Vec3::ZERO);
        Self {
            config: None,
            backend,
            transform: Transform::from_position(position),
            view: None,
            ground: None,
            enabled: true,
            input: Vec2::ZERO,
            is_moving: false,
            velocity: Vec3::ZERO,
            target_velocity: Vec3::ZERO,
            smoothing: Vec3::ZERO,
            measured_velocity: Vec3::ZERO,
            last_position: position,
            is_grounded: true,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self.backend.set_position(transform.position);
        self.last_position = transform.position;
        self
    }

    pub fn with_ground_probe(mut self, probe: impl GroundProbe + 'static) -> Self {
        self.ground = Some(Box::new(probe));
        self
    }

    pub fn config(&self) -> Option<&MovementConfig> {
        self.config.as_ref()
    }

    /// Replace the configuration and reset movement state.
    pub fn set_config(&mut self, config: MovementConfig) {
        self.config = Some(config);
        self.initialize();
    }

    pub fn initialize(&mut self) {
        self.input = Vec2::ZERO;
        self.velocity = Vec3::ZERO;
        self.target_velocity = Vec3::ZERO;
        self.smoothing = Vec3::ZERO;
        self.is_moving = false;
        self.enabled = true;
        debug!(backend = %self.backend.kind(), "movement executor initialized");
    }

    /// Camera axes for view-relative input, or `None` for world axes.
    pub fn set_view(&mut self, view: Option<ViewBasis>) {
        self.view = view;
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn backend(&self) -> &MovementBackend {
        &self.backend
    }

    pub fn body_mut(&mut self) -> Option<&mut (dyn PhysicsBody + 'static)> {
        self.backend.body_mut()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    /// Smoothed velocity handed to the backend.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn target_velocity(&self) -> Vec3 {
        self.target_velocity
    }

    /// Position change over the last tick divided by its length.
    pub fn measured_velocity(&self) -> Vec3 {
        self.measured_velocity
    }

    /// Store the direction for the next fixed tick.
    pub fn handle_movement(&mut self, direction: Vec2) {
        if !self.enabled || self.config.is_none() {
            return;
        }
        self.input = direction;
        self.is_moving = direction.length() > MOVING_THRESHOLD;
    }

    /// Disabling drops velocity to zero on the spot.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.input = Vec2::ZERO;
            self.target_velocity = Vec3::ZERO;
            self.velocity = Vec3::ZERO;
            self.smoothing = Vec3::ZERO;
            self.is_moving = false;
            self.backend.halt();
        }
    }

    pub fn stop(&mut self) {
        self.input = Vec2::ZERO;
        self.target_velocity = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.smoothing = Vec3::ZERO;
        self.is_moving = false;
        self.backend.halt();
    }

    pub fn teleport(&mut self, position: Vec3) {
        self.stop();
        self.transform.position = position;
        self.backend.set_position(position);
        self.last_position = position;
        self.measured_velocity = Vec3::ZERO;
        debug!(?position, "teleported");
    }

    /// World-space unit direction for a 2D input.
    pub fn world_direction(&self, input: Vec2) -> Vec3 {
        let (right, forward) = match (&self.config, &self.view) {
            (Some(config), _) if config.use_local_space => {
                (self.transform.right(), self.transform.forward())
            }
            (_, Some(view)) => (view.right, view.forward),
            _ => (Vec3::X, Vec3::Z),
        };
        (right * input.x + forward * input.y).normalize_or_zero()
    }

    /// Advance one fixed tick of `dt` seconds.
    pub fn fixed_update(&mut self, dt: f32) {
        let Some(config) = self.config.clone() else {
            return;
        };
        if !self.enabled || dt <= 0.0 {
            return;
        }

        self.target_velocity = if self.input.length() < MOVING_THRESHOLD {
            Vec3::ZERO
        } else {
            self.world_direction(self.input) * config.move_speed()
        };
        if config.constrain_to_ground {
            self.target_velocity.y = 0.0;
        }

        self.velocity = self.velocity.smooth_damp(
            self.target_velocity,
            &mut self.smoothing,
            config.smooth_time(self.is_moving),
            f32::INFINITY,
            dt,
        );

        if self.velocity.length() >= MIN_APPLIED_SPEED {
            self.transform.position = self.backend.apply(self.transform.position, self.velocity, dt);
        } else if let Some(position) = self.backend.position() {
            self.transform.position = position;
        }

        if config.rotate_to_movement {
            self.face_movement(config.rotation_speed(), dt);
        }
        if config.constrain_to_ground {
            self.probe_ground();
        }

        let position = self.transform.position;
        self.measured_velocity = (position - self.last_position) / dt;
        self.last_position = position;
        trace!(velocity = ?self.velocity, ?position, "movement tick");
    }

    fn face_movement(&mut self, rotation_speed: f32, dt: f32) {
        let horizontal = Vec3::new(self.velocity.x, 0.0, self.velocity.z);
        if horizontal.length() < FACING_MIN_SPEED {
            return;
        }
        let yaw = horizontal.x.atan2(horizontal.z);
        let target = Quat::from_rotation_y(yaw);
        let t = (rotation_speed * dt).min(1.0);
        self.transform.rotation = self.transform.rotation.slerp(target, t).normalize();
    }

    fn probe_ground(&mut self) {
        if let Some(probe) = &self.ground {
            let origin = self.transform.position + Vec3::Y * GROUND_PROBE_LIFT;
            self.is_grounded = probe.cast_down(origin, GROUND_PROBE_DISTANCE);
        }
    }

    pub fn stats(&self) -> MovementStats {
        MovementStats {
            is_moving: self.is_moving,
            current_speed: self.velocity.length(),
            target_speed: self.target_velocity.length(),
            is_grounded: self.is_grounded,
            backend: self.backend.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FlatGround, KinematicBody, SimpleCapsule};

    const DT: f32 = 1.0 / 60.0;

    fn direct() -> MovementExecutor {
        MovementExecutor::new(MovementConfig::default(), MovementBackend::DirectIntegration)
    }

    fn run(executor: &mut MovementExecutor, ticks: u32) {
        for _ in 0..ticks {
            executor.fixed_update(DT);
        }
    }

    #[test]
    fn accelerates_toward_move_speed() {
        let mut executor = direct();
        executor.handle_movement(Vec2::new(0.0, 1.0));
        executor.fixed_update(DT);
        let first = executor.velocity().z;
        assert!(first > 0.0 && first < 5.0);

        run(&mut executor, 120);
        assert!((executor.velocity() - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-2);
        assert!(executor.position().z > 5.0);
        assert!((executor.measured_velocity().z - executor.velocity().z).abs() < 1e-2);
    }

    #[test]
    fn decelerates_to_rest_after_release() {
        let mut executor = direct();
        executor.handle_movement(Vec2::new(1.0, 0.0));
        run(&mut executor, 60);
        executor.handle_movement(Vec2::ZERO);
        assert!(!executor.is_moving());

        executor.fixed_update(DT);
        assert!(executor.velocity().x > 0.0, "deceleration is smoothed");

        run(&mut executor, 120);
        assert!(executor.velocity().length() < MIN_APPLIED_SPEED);
        let resting = executor.position();
        run(&mut executor, 10);
        assert_eq!(executor.position(), resting);
    }

    #[test]
    fn disabling_stops_immediately() {
        let mut executor = direct();
        executor.handle_movement(Vec2::new(0.0, 1.0));
        run(&mut executor, 30);
        assert!(executor.velocity().length() > 1.0);

        executor.set_enabled(false);
        assert_eq!(executor.velocity(), Vec3::ZERO);
        assert_eq!(executor.target_velocity(), Vec3::ZERO);
        assert!(!executor.is_moving());

        executor.handle_movement(Vec2::new(0.0, 1.0));
        let parked = executor.position();
        run(&mut executor, 10);
        assert_eq!(executor.position(), parked);
    }

    #[test]
    fn unconfigured_executor_does_nothing() {
        let mut executor = MovementExecutor::unconfigured(MovementBackend::DirectIntegration);
        executor.handle_movement(Vec2::new(1.0, 0.0));
        run(&mut executor, 10);
        assert_eq!(executor.position(), Vec3::ZERO);
        assert!(!executor.is_moving());
    }

    #[test]
    fn ground_constraint_removes_vertical_motion() {
        let mut executor = direct();
        executor.set_view(Some(ViewBasis::from_rotation(Quat::from_rotation_x(-0.6))));
        executor.handle_movement(Vec2::new(0.0, 1.0));
        run(&mut executor, 60);
        assert_eq!(executor.velocity().y, 0.0);
        assert_eq!(executor.position().y, 0.0);
    }

    #[test]
    fn view_relative_and_local_axes() {
        let mut executor = direct();
        let yaw = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        executor.set_view(Some(ViewBasis::from_rotation(yaw)));
        // View forward is +X after a quarter turn.
        let dir = executor.world_direction(Vec2::new(0.0, 1.0));
        assert!((dir - Vec3::X).length() < 1e-5);

        let mut local = MovementExecutor::new(
            MovementConfig::default().with_local_space(true),
            MovementBackend::DirectIntegration,
        )
        .with_transform(Transform {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_y(std::f32::consts::PI),
        });
        local.set_view(Some(ViewBasis::from_rotation(yaw)));
        let dir = local.world_direction(Vec2::new(0.0, 1.0));
        assert!((dir - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let executor = direct();
        let dir = executor.world_direction(Vec2::new(1.0, 1.0));
        assert!((dir.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn physics_backend_receives_velocity() {
        let body = KinematicBody {
            velocity: Vec3::new(0.0, -2.0, 0.0),
            ..KinematicBody::default()
        };
        let mut executor = MovementExecutor::new(
            MovementConfig::default(),
            MovementBackend::PhysicsBody(Box::new(body)),
        );
        executor.handle_movement(Vec2::new(1.0, 0.0));
        run(&mut executor, 30);

        let applied = executor.body_mut().map(|b| b.velocity()).expect("body");
        assert!(applied.x > 0.0);
        assert_eq!(applied.y, -2.0);
        assert!(executor.position().x > 0.0);
        assert_eq!(executor.backend().position(), Some(executor.position()));

        executor.stop();
        assert_eq!(executor.body_mut().map(|b| b.velocity()), Some(Vec3::ZERO));
    }

    #[test]
    fn capsule_backend_tracks_position() {
        let mut executor = MovementExecutor::new(
            MovementConfig::default(),
            MovementBackend::CapsuleController(Box::new(SimpleCapsule::default())),
        );
        executor.handle_movement(Vec2::new(-1.0, 0.0));
        run(&mut executor, 60);
        assert!(executor.position().x < 0.0);
        assert_eq!(executor.backend().position(), Some(executor.position()));
    }

    #[test]
    fn teleport_resets_motion() {
        let mut executor = MovementExecutor::new(
            MovementConfig::default(),
            MovementBackend::CapsuleController(Box::new(SimpleCapsule::default())),
        );
        executor.handle_movement(Vec2::new(0.0, 1.0));
        run(&mut executor, 20);

        let target = Vec3::new(10.0, 0.0, -3.0);
        executor.teleport(target);
        assert_eq!(executor.position(), target);
        assert_eq!(executor.backend().position(), Some(target));
        assert_eq!(executor.velocity(), Vec3::ZERO);

        executor.fixed_update(DT);
        assert_eq!(executor.measured_velocity(), Vec3::ZERO);
    }

    #[test]
    fn ground_probe_reports_state() {
        let mut executor = direct()
            .with_ground_probe(FlatGround { height: 0.0 })
            .with_transform(Transform::from_position(Vec3::new(0.0, 3.0, 0.0)));
        executor.fixed_update(DT);
        assert!(!executor.is_grounded());

        executor.teleport(Vec3::ZERO);
        executor.fixed_update(DT);
        assert!(executor.is_grounded());
        assert!(executor.stats().is_grounded);
    }

    #[test]
    fn faces_direction_of_travel() {
        let mut executor = MovementExecutor::new(
            MovementConfig::default().with_rotate_to_movement(true),
            MovementBackend::DirectIntegration,
        );
        executor.handle_movement(Vec2::new(1.0, 0.0));
        run(&mut executor, 120);
        assert!((executor.transform().forward() - Vec3::X).length() < 1e-2);
    }

    #[test]
    fn stats_snapshot() {
        let mut executor = direct();
        executor.handle_movement(Vec2::new(0.0, 1.0));
        executor.fixed_update(DT);
        let stats = executor.stats();
        assert!(stats.is_moving);
        assert_eq!(stats.target_speed, 5.0);
        assert!(stats.current_speed > 0.0);
        assert_eq!(stats.backend, BackendKind::DirectIntegration);
    }
}
