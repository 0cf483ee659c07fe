//! Stride Core
//!
//! Contains the fundamental building blocks shared by the input pipeline:
//! - Fixed-rate simulation time
//! - Critically damped smoothing math
//! - Reusable object pools and bounded rings

pub mod math;
pub mod pool;
pub mod ring;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
