//! Easing functions for animations

use serde::{Deserialize, Serialize};

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    /// Quadratic ease-in-out, the curve used by scene preview
    #[default]
    EaseInOutQuad,
    EaseInOutCubic,
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutQuad => ease(t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }

    /// Name used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInQuad => "ease-in-quad",
            Easing::EaseOutQuad => "ease-out-quad",
            Easing::EaseInOutQuad => "ease-in-out-quad",
            Easing::EaseInOutCubic => "ease-in-out-cubic",
        }
    }
}

/// Quadratic ease-in-out over `[0, 1]`.
///
/// `2t²` below the midpoint, `-1 + (4 - 2t)·t` from it on. Exact at both
/// endpoints; callers clamp `t` before use.
pub fn ease(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}
