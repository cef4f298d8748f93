//! Typed scene model
//!
//! A document is an ordered list of frames. Frame indices are positions in
//! that list, so they are contiguous from 0 by construction; the sprite
//! `count` written to disk is likewise derived from the sprite list.

use scena_core::{AnimationDescriptor, ElementKey, ElementState, Transform2D};

/// Display identifier derived from a sprite slot
pub fn sprite_label(slot: usize) -> String {
    format!("Sprite: {slot}")
}

/// An image placed on the canvas: the background or one sprite
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    /// Opaque image reference (path or handle)
    pub image: String,
    /// Persisted, non-animated position and scale
    pub rest: Transform2D,
    /// Present exactly when animation is switched on
    pub animation: Option<AnimationDescriptor>,
}

impl Element {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }

    /// Switch animation on or off. Switching on creates a descriptor with a
    /// zero duration and the rest values as target; switching off removes it.
    ///
    /// Returns false when the element was already in the requested state.
    pub fn set_animated(&mut self, enabled: bool) -> bool {
        match (enabled, self.animation.is_some()) {
            (true, false) => {
                self.animation = Some(AnimationDescriptor::at_rest(self.rest));
                true
            }
            (false, true) => {
                self.animation = None;
                true
            }
            _ => false,
        }
    }

    fn state(&self, key: ElementKey) -> ElementState {
        ElementState {
            key,
            rest: self.rest,
            animation: self.animation,
        }
    }
}

/// A sprite: an element plus its display identifier
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sprite {
    pub label: String,
    pub element: Element,
}

/// Dense, zero-based sprite list of one frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpriteCollection {
    entries: Vec<Sprite>,
}

impl SpriteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sprites(entries: Vec<Sprite>) -> Self {
        Self { entries }
    }

    /// Number of sprites; always equal to the number of occupied slots
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Sprite> {
        self.entries.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Sprite> {
        self.entries.get_mut(slot)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sprite> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Sprite] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.label.as_str()).collect()
    }

    /// Append a sprite showing `image` at the default rest values
    pub fn push_image(&mut self, image: impl Into<String>) -> usize {
        let slot = self.entries.len();
        self.entries.push(Sprite {
            label: sprite_label(slot),
            element: Element::new(image),
        });
        slot
    }

    /// Deep-copy the sprite at `slot` onto the end of the list
    pub fn duplicate(&mut self, slot: usize) -> Option<usize> {
        let mut copy = self.entries.get(slot)?.clone();
        let new_slot = self.entries.len();
        copy.label = sprite_label(new_slot);
        self.entries.push(copy);
        Some(new_slot)
    }

    /// Remove the sprite at `slot`. Every later sprite moves down one slot
    /// and takes the label of its new slot.
    pub fn remove(&mut self, slot: usize) -> Option<Sprite> {
        if slot >= self.entries.len() {
            return None;
        }
        let removed = self.entries.remove(slot);
        for (index, sprite) in self.entries.iter_mut().enumerate().skip(slot) {
            sprite.label = sprite_label(index);
        }
        Some(removed)
    }

    /// Rebuild the list in the order given by display identifiers, then
    /// relabel every sprite from its new slot.
    ///
    /// Returns false, leaving the list unchanged, unless `order` names
    /// exactly the same multiset of identifiers as the current list.
    pub fn reorder<S: AsRef<str>>(&mut self, order: &[S]) -> bool {
        if order.len() != self.entries.len() {
            return false;
        }

        let mut taken = vec![false; self.entries.len()];
        let mut picks = Vec::with_capacity(order.len());
        for label in order {
            let label = label.as_ref();
            let found =
                (0..self.entries.len()).find(|&i| !taken[i] && self.entries[i].label == label);
            match found {
                Some(i) => {
                    taken[i] = true;
                    picks.push(i);
                }
                None => return false,
            }
        }

        let mut old: Vec<Option<Sprite>> = self.entries.drain(..).map(Some).collect();
        self.entries = picks.into_iter().filter_map(|i| old[i].take()).collect();
        for (slot, sprite) in self.entries.iter_mut().enumerate() {
            sprite.label = sprite_label(slot);
        }
        true
    }
}

impl<'a> IntoIterator for &'a SpriteCollection {
    type Item = &'a Sprite;
    type IntoIter = std::slice::Iter<'a, Sprite>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Speaker and dialogue line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextRecord {
    pub character_name: String,
    pub dialogue: String,
}

/// Time of day shown by the UI overlay
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    #[default]
    Unset,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 5] = [
        TimeOfDay::Unset,
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    /// Persisted label; unset is the empty string
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Unset => "",
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }
}

/// Secondary character-emotion overlay
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmotionOverlay {
    /// Image of the character's emotion
    pub portrait: String,
    /// Image drawn behind the portrait
    pub background: String,
    pub background_transform: Transform2D,
}

/// UI overlay of a frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiOverlay {
    pub time_of_day: TimeOfDay,
    pub chapter: String,
    /// Present exactly when the emotion overlay is switched on
    pub emotion: Option<EmotionOverlay>,
}

/// One composited scene
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub background: Element,
    pub text: TextRecord,
    pub ui: UiOverlay,
    pub sprites: SpriteCollection,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&self, key: ElementKey) -> Option<&Element> {
        match key {
            ElementKey::Background => Some(&self.background),
            ElementKey::Sprite(slot) => self.sprites.get(slot).map(|s| &s.element),
        }
    }

    pub fn element_mut(&mut self, key: ElementKey) -> Option<&mut Element> {
        match key {
            ElementKey::Background => Some(&mut self.background),
            ElementKey::Sprite(slot) => self.sprites.get_mut(slot).map(|s| &mut s.element),
        }
    }

    /// Rest state of every animatable element, background first
    pub fn element_states(&self) -> impl Iterator<Item = ElementState> + '_ {
        std::iter::once(self.background.state(ElementKey::Background)).chain(
            self.sprites
                .iter()
                .enumerate()
                .map(|(slot, sprite)| sprite.element.state(ElementKey::Sprite(slot))),
        )
    }

    /// Number of elements that would move during playback
    pub fn animated_count(&self) -> usize {
        self.element_states().filter(|s| s.is_animated()).count()
    }
}

/// The authoritative, ordered collection of frames
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneDocument {
    frames: Vec<Frame>,
}

impl SceneDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub(crate) fn frame_mut(&mut self, index: usize) -> Option<&mut Frame> {
        self.frames.get_mut(index)
    }

    pub(crate) fn push_frame(&mut self, frame: Frame) -> usize {
        self.frames.push(frame);
        self.frames.len() - 1
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scena_core::Vec2;

    fn collection(images: &[&str]) -> SpriteCollection {
        let mut sprites = SpriteCollection::new();
        for image in images {
            sprites.push_image(*image);
        }
        sprites
    }

    fn images(sprites: &SpriteCollection) -> Vec<&str> {
        sprites.iter().map(|s| s.element.image.as_str()).collect()
    }

    #[test]
    fn test_push_derives_labels() {
        let sprites = collection(&["a.png", "b.png"]);
        assert_eq!(sprites.count(), 2);
        assert_eq!(sprites.labels(), vec!["Sprite: 0", "Sprite: 1"]);
    }

    #[test]
    fn test_remove_shifts_and_relabels() {
        let mut sprites = collection(&["A", "B", "C"]);
        let removed = sprites.remove(1).map(|s| s.element.image);

        assert_eq!(removed.as_deref(), Some("B"));
        assert_eq!(sprites.count(), 2);
        assert_eq!(images(&sprites), vec!["A", "C"]);
        assert_eq!(sprites.labels(), vec!["Sprite: 0", "Sprite: 1"]);
    }

    #[test]
    fn test_remove_keeps_labels_before_slot() {
        let mut sprites = collection(&["A", "B", "C"]);
        if let Some(first) = sprites.get_mut(0) {
            first.label = "hero".to_string();
        }
        sprites.remove(1);
        assert_eq!(sprites.labels(), vec!["hero", "Sprite: 1"]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut sprites = collection(&["A"]);
        assert!(sprites.remove(1).is_none());
        assert_eq!(sprites.count(), 1);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut sprites = collection(&["A"]);
        if let Some(first) = sprites.get_mut(0) {
            first.element.set_animated(true);
        }

        assert_eq!(sprites.duplicate(0), Some(1));
        assert_eq!(sprites.labels(), vec!["Sprite: 0", "Sprite: 1"]);

        if let Some(copy) = sprites.get_mut(1) {
            copy.element.rest.position = Vec2::new(99.0, 99.0);
            copy.element.image = "changed".to_string();
            copy.element.set_animated(false);
        }

        let original = &sprites.as_slice()[0].element;
        assert_eq!(original.image, "A");
        assert_eq!(original.rest.position, Vec2::ZERO);
        assert!(original.is_animated());
    }

    #[test]
    fn test_reorder_by_labels() {
        let mut sprites = collection(&["A", "B", "C"]);
        assert!(sprites.reorder(&["Sprite: 2", "Sprite: 0", "Sprite: 1"]));
        assert_eq!(images(&sprites), vec!["C", "A", "B"]);
        assert_eq!(sprites.labels(), vec!["Sprite: 0", "Sprite: 1", "Sprite: 2"]);
    }

    #[test]
    fn test_reorder_rejects_foreign_or_missing_labels() {
        let mut sprites = collection(&["A", "B"]);
        let before = sprites.clone();

        assert!(!sprites.reorder(&["Sprite: 0", "Sprite: 7"]));
        assert!(!sprites.reorder(&["Sprite: 0"]));
        assert!(!sprites.reorder(&["Sprite: 0", "Sprite: 0"]));
        assert_eq!(sprites, before);
    }

    #[test]
    fn test_reorder_with_duplicate_labels() {
        let mut sprites = SpriteCollection::from_sprites(vec![
            Sprite {
                label: "twin".into(),
                element: Element::new("A"),
            },
            Sprite {
                label: "solo".into(),
                element: Element::new("B"),
            },
            Sprite {
                label: "twin".into(),
                element: Element::new("C"),
            },
        ]);
        assert!(sprites.reorder(&["solo", "twin", "twin"]));
        assert_eq!(images(&sprites), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_set_animated_creates_and_removes_descriptor() {
        let mut element = Element::new("bg.png");
        element.rest = Transform2D::new(Vec2::new(4.0, 5.0), Vec2::new(2.0, 2.0));

        assert!(element.set_animated(true));
        assert_eq!(
            element.animation,
            Some(AnimationDescriptor::at_rest(element.rest))
        );
        assert!(!element.set_animated(true));

        assert!(element.set_animated(false));
        assert_eq!(element.animation, None);
        assert!(!element.set_animated(false));
    }

    #[test]
    fn test_element_states_cover_background_and_sprites() {
        let mut frame = Frame::new();
        frame.sprites.push_image("a.png");
        frame.sprites.push_image("b.png");
        frame.background.set_animated(true);

        let keys: Vec<ElementKey> = frame.element_states().map(|s| s.key).collect();
        assert_eq!(
            keys,
            vec![
                ElementKey::Background,
                ElementKey::Sprite(0),
                ElementKey::Sprite(1)
            ]
        );
        assert_eq!(frame.animated_count(), 1);
    }

    #[test]
    fn test_time_of_day_labels() {
        assert_eq!(TimeOfDay::from_label(""), Some(TimeOfDay::Unset));
        assert_eq!(TimeOfDay::from_label("Evening"), Some(TimeOfDay::Evening));
        assert_eq!(TimeOfDay::from_label("Dusk"), None);
        assert_eq!(TimeOfDay::Night.as_str(), "Night");
    }
}
