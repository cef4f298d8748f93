//! Animatable elements as seen by playback

use crate::geometry::Transform2D;

/// Addresses an animatable element within a single frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKey {
    Background,
    /// Sprite by slot index
    Sprite(usize),
}

impl std::fmt::Display for ElementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKey::Background => f.write_str("background"),
            ElementKey::Sprite(slot) => write!(f, "sprite {slot}"),
        }
    }
}

/// Duration and target of an element's playback.
///
/// An element carries a descriptor exactly when its animation is switched on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationDescriptor {
    /// Time to travel from rest to target, in milliseconds
    pub duration_ms: u64,
    /// Position and scale reached at the end of playback
    pub target: Transform2D,
}

impl AnimationDescriptor {
    pub fn new(duration_ms: u64, target: Transform2D) -> Self {
        Self {
            duration_ms,
            target,
        }
    }

    /// The descriptor created when animation is switched on: zero duration,
    /// target equal to the rest values.
    pub fn at_rest(rest: Transform2D) -> Self {
        Self::new(0, rest)
    }
}

/// Rest state of one element, as captured when playback starts
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementState {
    pub key: ElementKey,
    pub rest: Transform2D,
    pub animation: Option<AnimationDescriptor>,
}

impl ElementState {
    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }
}
