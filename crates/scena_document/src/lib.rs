//! Scena Document
//!
//! The scene data store and everything that reads or writes it:
//!
//! - **Model**: frames holding a background, text, UI overlay and a dense sprite list
//! - **Store**: edit operations that emit change events and reject invalid input
//! - **Codec / IO**: the JSON document format, validated once at load
//! - **Session**: current file, dirty flag, active frame and preview playback
//!
//! # Example
//!
//! ```rust
//! use scena_document::{ElementKey, SceneStore};
//!
//! let mut store = SceneStore::new();
//! let frame = store.add_frame();
//! store.add_sprite(frame, "sprites/girl.png").unwrap();
//! store.set_animation_enabled(frame, ElementKey::Sprite(0), true).unwrap();
//!
//! let sprite = &store.frame(frame).unwrap().sprites.as_slice()[0];
//! assert_eq!(sprite.label, "Sprite: 0");
//! assert!(sprite.element.is_animated());
//! ```

pub mod codec;
pub mod error;
pub mod io;
pub mod model;
pub mod session;
pub mod store;

pub use codec::{from_json_slice, to_json_vec};
pub use error::{DocumentError, EditError, EditResult, Result};
pub use io::{load, save};
pub use model::{
    sprite_label, Element, EmotionOverlay, Frame, SceneDocument, Sprite, SpriteCollection,
    TextRecord, TimeOfDay, UiOverlay,
};
pub use scena_core::{ChangeEvent, ChangeKind, ElementKey, PlaybackState, Transform2D, Vec2};
pub use session::Session;
pub use store::SceneStore;
