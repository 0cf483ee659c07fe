//! Deterministic math utilities
//!
//! Re-exports glam with critically damped smoothing on top.

pub use glam::*;

/// Floor applied to smoothing time constants to keep `2 / smooth_time` finite.
const MIN_SMOOTH_TIME: f32 = 1e-4;

/// Critically damped spring interpolation toward a target.
///
/// The velocity is carried between calls by the caller, which makes the
/// result independent of tick rate for a fixed `smooth_time`. The approach
/// never overshoots the target.
pub trait SmoothDamp: Sized + Copy {
    fn smooth_damp(
        self,
        target: Self,
        velocity: &mut Self,
        smooth_time: f32,
        max_speed: f32,
        dt: f32,
    ) -> Self;
}

macro_rules! impl_smooth_damp {
    ($($ty:ty),+ $(,)?) => {$(
        impl SmoothDamp for $ty {
            fn smooth_damp(
                self,
                target: Self,
                velocity: &mut Self,
                smooth_time: f32,
                max_speed: f32,
                dt: f32,
            ) -> Self {
                if dt <= 0.0 {
                    return self;
                }

                let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
                let omega = 2.0 / smooth_time;
                let x = omega * dt;
                // Pade-style approximation of exp(-x), stable for large x.
                let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

                let max_change = max_speed * smooth_time;
                let change = (self - target).clamp_length_max(max_change);
                let goal = self - change;

                let temp = (*velocity + change * omega) * dt;
                *velocity = (*velocity - temp * omega) * decay;
                let mut output = goal + (change + temp) * decay;

                // Clamp if we crossed the original target.
                if (target - self).dot(output - target) > 0.0 {
                    output = target;
                    *velocity = (output - target) / dt;
                }
                output
            }
        }
    )+};
}

impl_smooth_damp!(Vec2, Vec3);
