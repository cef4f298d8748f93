//! Plane geometry

use serde::{Deserialize, Serialize};

/// A pair of reals, used both for positions and for per-axis scale factors.
///
/// Values are unbounded; clamping to a canvas is left to the editing shell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    /// Nominal rest scale
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Neither component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Position and scale of an element on the canvas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub position: Vec2,
    pub scale: Vec2,
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        position: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    pub const fn new(position: Vec2, scale: Vec2) -> Self {
        Self { position, scale }
    }

    /// Builder: replace the position
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Builder: replace the scale
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.scale.is_finite()
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}
