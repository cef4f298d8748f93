//! Scena Animation System
//!
//! Easing, interpolation and timeline playback for scene preview.
//!
//! # Features
//!
//! - **Easing**: monotonic reparameterizations of linear progress
//! - **Interpolation**: affine blends between rest and target transforms
//! - **Timeline**: per-frame playback with automatic completion
//! - **Non-destructive**: interpolated values live in a transient view only

pub mod easing;
pub mod interpolate;
pub mod scheduler;
pub mod timeline;
pub mod transient;

pub use easing::{ease, Easing};
pub use interpolate::{interpolate, progress, Lerp};
pub use scheduler::{TickScheduler, DEFAULT_TICK_HZ};
pub use timeline::{TickOutcome, TimelineController};
pub use transient::TransientView;
