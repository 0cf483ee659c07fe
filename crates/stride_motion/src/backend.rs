//! Ways to apply a velocity to an entity, and the collaborators they drive

use glam::Vec3;
use std::fmt;

/// A simulated rigid body owned by an external physics step.
pub trait PhysicsBody {
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    /// Advance one tick after the velocity is set. Bodies owned by an
    /// external simulation leave this empty.
    fn step(&mut self, _dt: f32) {}
}

/// A collide-and-slide character capsule.
pub trait CapsuleController {
    fn move_by(&mut self, delta: Vec3);
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
}

/// Downward ray query against walkable geometry.
pub trait GroundProbe {
    fn cast_down(&self, origin: Vec3, distance: f32) -> bool;
}

/// Infinite horizontal plane at `height`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGround {
    pub height: f32,
}

impl GroundProbe for FlatGround {
    fn cast_down(&self, origin: Vec3, distance: f32) -> bool {
        origin.y >= self.height && origin.y - distance <= self.height
    }
}

/// Body that integrates its own velocity when stepped.
#[derive(Debug, Clone, Copy, Default)]
pub struct KinematicBody {
    pub position: Vec3,
    pub velocity: Vec3,
}

impl PhysicsBody for KinematicBody {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn step(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

/// Capsule that never collides; moves exactly by the requested delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCapsule {
    pub position: Vec3,
}

impl CapsuleController for SimpleCapsule {
    fn move_by(&mut self, delta: Vec3) {
        self.position += delta;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    DirectIntegration,
    PhysicsBody,
    CapsuleController,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::DirectIntegration => "direct",
            BackendKind::PhysicsBody => "physics_body",
            BackendKind::CapsuleController => "capsule",
        };
        f.write_str(name)
    }
}

/// Exactly one way of applying velocity per executor.
pub enum MovementBackend {
    /// Add `velocity * dt` to the entity position.
    DirectIntegration,
    /// Assign horizontal velocity, keep the body's own vertical velocity.
    PhysicsBody(Box<dyn PhysicsBody>),
    /// Ask the capsule to move by `velocity * dt`.
    CapsuleController(Box<dyn CapsuleController>),
}

impl MovementBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            MovementBackend::DirectIntegration => BackendKind::DirectIntegration,
            MovementBackend::PhysicsBody(_) => BackendKind::PhysicsBody,
            MovementBackend::CapsuleController(_) => BackendKind::CapsuleController,
        }
    }

    /// Apply one tick of `velocity`. Returns the entity position afterwards.
    pub fn apply(&mut self, position: Vec3, velocity: Vec3, dt: f32) -> Vec3 {
        match self {
            MovementBackend::DirectIntegration => position + velocity * dt,
            MovementBackend::PhysicsBody(body) => {
                let vertical = body.velocity().y;
                body.set_velocity(Vec3::new(velocity.x, vertical, velocity.z));
                body.step(dt);
                body.position()
            }
            MovementBackend::CapsuleController(capsule) => {
                capsule.move_by(velocity * dt);
                capsule.position()
            }
        }
    }

    /// Backend-reported position, if it owns one.
    pub fn position(&self) -> Option<Vec3> {
        match self {
            MovementBackend::DirectIntegration => None,
            MovementBackend::PhysicsBody(body) => Some(body.position()),
            MovementBackend::CapsuleController(capsule) => Some(capsule.position()),
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        match self {
            MovementBackend::DirectIntegration => {}
            MovementBackend::PhysicsBody(body) => body.set_position(position),
            MovementBackend::CapsuleController(capsule) => capsule.set_position(position),
        }
    }

    /// Halt any velocity the backend carries between ticks.
    pub fn halt(&mut self) {
        if let MovementBackend::PhysicsBody(body) = self {
            body.set_velocity(Vec3::ZERO);
        }
    }

    pub fn body(&self) -> Option<&dyn PhysicsBody> {
        match self {
            MovementBackend::PhysicsBody(body) => Some(body.as_ref()),
            _ => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut (dyn PhysicsBody + 'static)> {
        match self {
            MovementBackend::PhysicsBody(body) => Some(body.as_mut()),
            _ => None,
        }
    }
}

impl fmt::Debug for MovementBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MovementBackend({})", self.kind())
    }
}
