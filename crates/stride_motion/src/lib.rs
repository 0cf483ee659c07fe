//! Stride Motion
//!
//! Velocity smoothing and application for a single directly controlled
//! entity.

pub mod backend;
pub mod config;
pub mod executor;

pub use backend::{
    BackendKind, CapsuleController, FlatGround, GroundProbe, KinematicBody, MovementBackend,
    PhysicsBody, SimpleCapsule,
};
pub use config::MovementConfig;
pub use executor::{MovementExecutor, MovementStats, Transform, ViewBasis};
