//! Per-tick interpolated values
//!
//! The transient view is owned by the timeline and never written back to
//! the document. An element absent from the view renders at rest.

use rustc_hash::FxHashMap;
use scena_core::{ElementKey, Transform2D};

#[derive(Clone, Debug, Default)]
pub struct TransientView {
    values: FxHashMap<ElementKey, Transform2D>,
}

impl TransientView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ElementKey) -> Option<Transform2D> {
        self.values.get(&key).copied()
    }

    /// The transient value if present, otherwise `rest`
    pub fn resolve(&self, key: ElementKey, rest: Transform2D) -> Transform2D {
        self.get(key).unwrap_or(rest)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn insert(&mut self, key: ElementKey, value: Transform2D) {
        self.values.insert(key, value);
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}
