//! Interpolation between rest and target values

use scena_core::{Transform2D, Vec2};

/// Values that can be blended along a progress parameter
pub trait Lerp: Sized {
    /// Affine blend: `self` at `t = 0`, `other` at `t = 1`
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    #[inline]
    fn lerp(&self, other: &Self, t: f64) -> Self {
        // (1-t)·a + t·b reproduces both endpoints bit-for-bit
        (1.0 - t) * self + t * other
    }
}

impl Lerp for Vec2 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Vec2::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }
}

impl Lerp for Transform2D {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Transform2D::new(
            self.position.lerp(&other.position, t),
            self.scale.lerp(&other.scale, t),
        )
    }
}

/// Transient transform at an already-eased `progress`
pub fn interpolate(start: Transform2D, target: Transform2D, progress: f64) -> Transform2D {
    start.lerp(&target, progress)
}

/// Linear progress of an animation, clamped to `[0, 1]`.
///
/// A zero duration is complete immediately.
pub fn progress(elapsed_ms: f64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms as f64).clamp(0.0, 1.0)
}
