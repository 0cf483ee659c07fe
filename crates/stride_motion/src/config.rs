use serde::{Deserialize, Serialize};

pub const MOVE_SPEED_RANGE: (f32, f32) = (0.1, 20.0);
pub const ACCELERATION_RANGE: (f32, f32) = (0.1, 50.0);
pub const ROTATION_SPEED_RANGE: (f32, f32) = (0.1, 20.0);

fn clamp_range(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Movement tuning. Numeric fields are clamped on assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    move_speed: f32,
    acceleration: f32,
    deceleration: f32,
    rotation_speed: f32,
    /// Interpret input on the entity's own axes instead of the view's.
    pub use_local_space: bool,
    /// Strip vertical velocity and probe for ground each tick.
    pub constrain_to_ground: bool,
    /// Turn the entity toward its horizontal velocity.
    pub rotate_to_movement: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            acceleration: 10.0,
            deceleration: 15.0,
            rotation_speed: 10.0,
            use_local_space: false,
            constrain_to_ground: true,
            rotate_to_movement: false,
        }
    }
}

impl MovementConfig {
    /// Units per second at full input.
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    pub fn deceleration(&self) -> f32 {
        self.deceleration
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn set_move_speed(&mut self, value: f32) {
        self.move_speed = clamp_range(value, MOVE_SPEED_RANGE);
    }

    pub fn set_acceleration(&mut self, value: f32) {
        self.acceleration = clamp_range(value, ACCELERATION_RANGE);
    }

    pub fn set_deceleration(&mut self, value: f32) {
        self.deceleration = clamp_range(value, ACCELERATION_RANGE);
    }

    pub fn set_rotation_speed(&mut self, value: f32) {
        self.rotation_speed = clamp_range(value, ROTATION_SPEED_RANGE);
    }

    pub fn with_move_speed(mut self, value: f32) -> Self {
        self.set_move_speed(value);
        self
    }

    pub fn with_acceleration(mut self, value: f32) -> Self {
        self.set_acceleration(value);
        self
    }

    pub fn with_deceleration(mut self, value: f32) -> Self {
        self.set_deceleration(value);
        self
    }

    pub fn with_rotation_speed(mut self, value: f32) -> Self {
        self.set_rotation_speed(value);
        self
    }

    pub fn with_local_space(mut self, enabled: bool) -> Self {
        self.use_local_space = enabled;
        self
    }

    pub fn with_ground_constraint(mut self, enabled: bool) -> Self {
        self.constrain_to_ground = enabled;
        self
    }

    pub fn with_rotate_to_movement(mut self, enabled: bool) -> Self {
        self.rotate_to_movement = enabled;
        self
    }

    /// Smoothing time constant for the current phase.
    pub fn smooth_time(&self, accelerating: bool) -> f32 {
        if accelerating {
            1.0 / self.acceleration
        } else {
            1.0 / self.deceleration
        }
    }

    /// Re-apply every clamp. Used after loading from disk.
    pub fn clamped(mut self) -> Self {
        self.set_move_speed(self.move_speed);
        self.set_acceleration(self.acceleration);
        self.set_deceleration(self.deceleration);
        self.set_rotation_speed(self.rotation_speed);
        self
    }
}
