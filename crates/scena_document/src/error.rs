//! Document error types

use scena_core::ElementKey;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading or saving a scene document.
///
/// A failed load never touches the document already held in memory.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Source file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Target file could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON or a missing required key
    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level key that is not a canonical non-negative integer
    #[error("frame key {0:?} is not a frame index")]
    FrameKey(String),

    /// Frame indices do not run contiguously from 0
    #[error("frame {0} is missing; frame indices must be contiguous from 0")]
    MissingFrame(usize),

    /// Sprite entry key that is not a canonical slot index
    #[error("frame {frame}: sprite key {key:?} is not a slot index")]
    SpriteKey { frame: usize, key: String },

    /// The `count` field disagrees with the entries present
    #[error("frame {frame}: sprite count is {count} but {found} sprites are present")]
    SpriteCount {
        frame: usize,
        count: usize,
        found: usize,
    },

    /// Sprite slots do not run contiguously from 0
    #[error("frame {frame}: sprite slot {slot} is missing")]
    MissingSprite { frame: usize, slot: usize },

    /// A coordinate is NaN or infinite and cannot be written as JSON
    #[error("frame {0}: position or scale is not a finite number")]
    NonFinite(usize),

    /// Save requested before any path was chosen
    #[error("document has no file path yet; save it under a name first")]
    NoPath,
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Rejected edit operations. The document is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("frame {0} does not exist")]
    NoSuchFrame(usize),

    #[error("frame {frame} has no sprite in slot {slot}")]
    NoSuchSprite { frame: usize, slot: usize },

    #[error("frame {frame}: new order must name each of its {expected} sprites exactly once")]
    ReorderMismatch { frame: usize, expected: usize },

    #[error("frame {frame}: {element} has no animation")]
    NotAnimated { frame: usize, element: ElementKey },

    #[error("frame {frame}: emotion overlay is switched off")]
    EmotionDisabled { frame: usize },

    #[error("frame {frame}: coordinates must be finite numbers")]
    NonFinite { frame: usize },
}

/// Result type for edit operations
pub type EditResult<T> = std::result::Result<T, EditError>;
