//! Scena Core
//!
//! Foundational types shared by the scene document and the playback engine:
//!
//! - **Geometry**: `Vec2` positions and scale factors, `Transform2D` pairs
//! - **Elements**: addressing of animatable elements and their animation descriptors
//! - **Change Events**: subscribe/notify dispatch for document mutations
//! - **Playback State Machine**: the `Idle`/`Running` lifecycle of a preview
//!
//! # Example
//!
//! ```rust
//! use scena_core::fsm::{PlaybackEvent, PlaybackMachine, PlaybackState};
//!
//! let mut machine = PlaybackMachine::new();
//! assert_eq!(machine.send(PlaybackEvent::Start), PlaybackState::Running);
//! assert_eq!(machine.send(PlaybackEvent::Complete), PlaybackState::Idle);
//! ```

pub mod element;
pub mod events;
pub mod fsm;
pub mod geometry;

pub use element::{AnimationDescriptor, ElementKey, ElementState};
pub use events::{ChangeEvent, ChangeKind, EventDispatcher, SubscriptionId};
pub use fsm::{PlaybackEvent, PlaybackMachine, PlaybackState, Transition};
pub use geometry::{Transform2D, Vec2};
