//! Scene data store
//!
//! [`SceneStore`] owns the document and is the only way to mutate it. Every
//! successful edit emits one [`ChangeEvent`]; a rejected edit returns an
//! [`EditError`] and leaves the document exactly as it was.

use crate::error::{EditError, EditResult};
use crate::model::{Element, EmotionOverlay, Frame, SceneDocument, Sprite, TimeOfDay};
use scena_core::{
    AnimationDescriptor, ChangeEvent, ChangeKind, ElementKey, EventDispatcher, SubscriptionId,
    Vec2,
};
use tracing::debug;

/// The authoritative document plus its change subscribers
#[derive(Debug, Default)]
pub struct SceneStore {
    document: SceneDocument,
    dispatcher: EventDispatcher,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: SceneDocument) -> Self {
        Self {
            document,
            dispatcher: EventDispatcher::new(),
        }
    }

    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    pub fn frame(&self, frame: usize) -> Option<&Frame> {
        self.document.frame(frame)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(handler)
    }

    pub fn subscribe_kind<F>(&mut self, kind: ChangeKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe_kind(kind, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Announce an event to subscribers without changing the document
    pub fn notify(&self, event: ChangeEvent) {
        debug!(?event, "change");
        self.dispatcher.dispatch(&event);
    }

    /// Swap in a whole new document, returning the previous one
    pub fn replace(&mut self, document: SceneDocument) -> SceneDocument {
        let previous = std::mem::replace(&mut self.document, document);
        self.notify(ChangeEvent::DocumentReplaced);
        previous
    }

    fn frame_mut(&mut self, frame: usize) -> EditResult<&mut Frame> {
        self.document
            .frame_mut(frame)
            .ok_or(EditError::NoSuchFrame(frame))
    }

    fn element_mut(&mut self, frame: usize, key: ElementKey) -> EditResult<&mut Element> {
        let target = self.frame_mut(frame)?;
        match key {
            ElementKey::Background => Ok(&mut target.background),
            ElementKey::Sprite(slot) => target
                .element_mut(key)
                .ok_or(EditError::NoSuchSprite { frame, slot }),
        }
    }

    fn animation_mut(
        &mut self,
        frame: usize,
        key: ElementKey,
    ) -> EditResult<&mut AnimationDescriptor> {
        self.element_mut(frame, key)?
            .animation
            .as_mut()
            .ok_or(EditError::NotAnimated {
                frame,
                element: key,
            })
    }

    fn check_finite(frame: usize, value: Vec2) -> EditResult<Vec2> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EditError::NonFinite { frame })
        }
    }

    fn emotion_mut(&mut self, frame: usize) -> EditResult<&mut EmotionOverlay> {
        self.frame_mut(frame)?
            .ui
            .emotion
            .as_mut()
            .ok_or(EditError::EmotionDisabled { frame })
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Append an empty frame and return its index
    pub fn add_frame(&mut self) -> usize {
        let frame = self.document.push_frame(Frame::new());
        self.notify(ChangeEvent::FrameAdded { frame });
        frame
    }

    /// Append a sprite showing `image` at the default rest values
    pub fn add_sprite(&mut self, frame: usize, image: impl Into<String>) -> EditResult<usize> {
        let slot = self.frame_mut(frame)?.sprites.push_image(image);
        self.notify(ChangeEvent::SpritesRestructured { frame });
        Ok(slot)
    }

    /// Append an independent copy of the sprite at `slot`
    pub fn duplicate_sprite(&mut self, frame: usize, slot: usize) -> EditResult<usize> {
        let copy = self
            .frame_mut(frame)?
            .sprites
            .duplicate(slot)
            .ok_or(EditError::NoSuchSprite { frame, slot })?;
        self.notify(ChangeEvent::SpritesRestructured { frame });
        Ok(copy)
    }

    /// Remove the sprite at `slot`, shifting later sprites down
    pub fn delete_sprite(&mut self, frame: usize, slot: usize) -> EditResult<Sprite> {
        let removed = self
            .frame_mut(frame)?
            .sprites
            .remove(slot)
            .ok_or(EditError::NoSuchSprite { frame, slot })?;
        self.notify(ChangeEvent::SpritesRestructured { frame });
        Ok(removed)
    }

    /// Rebuild the sprite list in the order given by display identifiers
    pub fn reorder_sprites<S: AsRef<str>>(&mut self, frame: usize, order: &[S]) -> EditResult<()> {
        let sprites = &mut self.frame_mut(frame)?.sprites;
        if !sprites.reorder(order) {
            return Err(EditError::ReorderMismatch {
                frame,
                expected: sprites.count(),
            });
        }
        self.notify(ChangeEvent::SpritesRestructured { frame });
        Ok(())
    }

    // =========================================================================
    // Elements
    // =========================================================================

    pub fn set_image(
        &mut self,
        frame: usize,
        key: ElementKey,
        image: impl Into<String>,
    ) -> EditResult<()> {
        self.element_mut(frame, key)?.image = image.into();
        self.notify(ChangeEvent::ElementChanged {
            frame,
            element: key,
        });
        Ok(())
    }

    pub fn set_rest_position(
        &mut self,
        frame: usize,
        key: ElementKey,
        position: Vec2,
    ) -> EditResult<()> {
        let position = Self::check_finite(frame, position)?;
        self.element_mut(frame, key)?.rest.position = position;
        self.notify(ChangeEvent::ElementChanged {
            frame,
            element: key,
        });
        Ok(())
    }

    pub fn set_rest_scale(&mut self, frame: usize, key: ElementKey, scale: Vec2) -> EditResult<()> {
        let scale = Self::check_finite(frame, scale)?;
        self.element_mut(frame, key)?.rest.scale = scale;
        self.notify(ChangeEvent::ElementChanged {
            frame,
            element: key,
        });
        Ok(())
    }

    /// Switch animation on or off for one element.
    ///
    /// Returns whether anything changed; no event is emitted otherwise.
    pub fn set_animation_enabled(
        &mut self,
        frame: usize,
        key: ElementKey,
        enabled: bool,
    ) -> EditResult<bool> {
        let changed = self.element_mut(frame, key)?.set_animated(enabled);
        if changed {
            self.notify(ChangeEvent::AnimationChanged {
                frame,
                element: key,
            });
        }
        Ok(changed)
    }

    pub fn set_animation_duration(
        &mut self,
        frame: usize,
        key: ElementKey,
        duration_ms: u64,
    ) -> EditResult<()> {
        self.animation_mut(frame, key)?.duration_ms = duration_ms;
        self.notify(ChangeEvent::AnimationChanged {
            frame,
            element: key,
        });
        Ok(())
    }

    pub fn set_animation_target_position(
        &mut self,
        frame: usize,
        key: ElementKey,
        position: Vec2,
    ) -> EditResult<()> {
        let position = Self::check_finite(frame, position)?;
        self.animation_mut(frame, key)?.target.position = position;
        self.notify(ChangeEvent::AnimationChanged {
            frame,
            element: key,
        });
        Ok(())
    }

    pub fn set_animation_target_scale(
        &mut self,
        frame: usize,
        key: ElementKey,
        scale: Vec2,
    ) -> EditResult<()> {
        let scale = Self::check_finite(frame, scale)?;
        self.animation_mut(frame, key)?.target.scale = scale;
        self.notify(ChangeEvent::AnimationChanged {
            frame,
            element: key,
        });
        Ok(())
    }

    // =========================================================================
    // Text
    // =========================================================================

    pub fn set_character_name(&mut self, frame: usize, name: impl Into<String>) -> EditResult<()> {
        self.frame_mut(frame)?.text.character_name = name.into();
        self.notify(ChangeEvent::TextChanged { frame });
        Ok(())
    }

    pub fn set_dialogue(&mut self, frame: usize, dialogue: impl Into<String>) -> EditResult<()> {
        self.frame_mut(frame)?.text.dialogue = dialogue.into();
        self.notify(ChangeEvent::TextChanged { frame });
        Ok(())
    }

    // =========================================================================
    // UI overlay
    // =========================================================================

    pub fn set_time_of_day(&mut self, frame: usize, time: TimeOfDay) -> EditResult<()> {
        self.frame_mut(frame)?.ui.time_of_day = time;
        self.notify(ChangeEvent::UiChanged { frame });
        Ok(())
    }

    pub fn set_chapter(&mut self, frame: usize, chapter: impl Into<String>) -> EditResult<()> {
        self.frame_mut(frame)?.ui.chapter = chapter.into();
        self.notify(ChangeEvent::UiChanged { frame });
        Ok(())
    }

    /// Give a frame with an empty chapter the chapter of the frame before it.
    ///
    /// Returns whether the chapter changed.
    pub fn inherit_chapter(&mut self, frame: usize) -> EditResult<bool> {
        let previous = match frame.checked_sub(1) {
            Some(prev) => self.document.frame(prev).map(|f| f.ui.chapter.clone()),
            None => None,
        };
        let target = self.frame_mut(frame)?;
        let Some(chapter) = previous.filter(|_| target.ui.chapter.is_empty()) else {
            return Ok(false);
        };
        if chapter.is_empty() {
            return Ok(false);
        }
        target.ui.chapter = chapter;
        self.notify(ChangeEvent::UiChanged { frame });
        Ok(true)
    }

    /// Switch the emotion overlay on or off. Switching off clears its fields.
    ///
    /// Returns whether anything changed.
    pub fn set_emotion_enabled(&mut self, frame: usize, enabled: bool) -> EditResult<bool> {
        let emotion = &mut self.frame_mut(frame)?.ui.emotion;
        let changed = match (enabled, emotion.is_some()) {
            (true, false) => {
                *emotion = Some(EmotionOverlay::default());
                true
            }
            (false, true) => {
                *emotion = None;
                true
            }
            _ => false,
        };
        if changed {
            self.notify(ChangeEvent::UiChanged { frame });
        }
        Ok(changed)
    }

    pub fn set_emotion_portrait(
        &mut self,
        frame: usize,
        image: impl Into<String>,
    ) -> EditResult<()> {
        self.emotion_mut(frame)?.portrait = image.into();
        self.notify(ChangeEvent::UiChanged { frame });
        Ok(())
    }

    pub fn set_emotion_background(
        &mut self,
        frame: usize,
        image: impl Into<String>,
    ) -> EditResult<()> {
        self.emotion_mut(frame)?.background = image.into();
        self.notify(ChangeEvent::UiChanged { frame });
        Ok(())
    }

    pub fn set_emotion_position(&mut self, frame: usize, position: Vec2) -> EditResult<()> {
        let position = Self::check_finite(frame, position)?;
        self.emotion_mut(frame)?.background_transform.position = position;
        self.notify(ChangeEvent::UiChanged { frame });
        Ok(())
    }

    pub fn set_emotion_scale(&mut self, frame: usize, scale: Vec2) -> EditResult<()> {
        let scale = Self::check_finite(frame, scale)?;
        self.emotion_mut(frame)?.background_transform.scale = scale;
        self.notify(ChangeEvent::UiChanged { frame });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scena_core::Transform2D;
    use std::sync::{Arc, Mutex};

    fn recording_store() -> (SceneStore, Arc<Mutex<Vec<ChangeEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let mut store = SceneStore::new();
        store.subscribe(move |event| events_clone.lock().unwrap().push(event.clone()));
        (store, events)
    }

    fn store_with_sprites(images: &[&str]) -> SceneStore {
        let mut store = SceneStore::new();
        let frame = store.add_frame();
        for image in images {
            store.add_sprite(frame, *image).unwrap();
        }
        store
    }

    fn images(store: &SceneStore, frame: usize) -> Vec<String> {
        store
            .frame(frame)
            .map(|f| f.sprites.iter().map(|s| s.element.image.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_add_frame_is_contiguous_and_empty() {
        let (mut store, events) = recording_store();
        assert_eq!(store.add_frame(), 0);
        assert_eq!(store.add_frame(), 1);

        let frame = store.frame(1).unwrap();
        assert_eq!(frame.sprites.count(), 0);
        assert!(!frame.background.is_animated());
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ChangeEvent::FrameAdded { frame: 0 },
                ChangeEvent::FrameAdded { frame: 1 }
            ]
        );
    }

    #[test]
    fn test_add_sprite_defaults() {
        let mut store = store_with_sprites(&["girl.png"]);
        let slot = store.add_sprite(0, "boy.png").unwrap();
        assert_eq!(slot, 1);

        let sprite = store.frame(0).unwrap().sprites.get(1).unwrap();
        assert_eq!(sprite.label, "Sprite: 1");
        assert_eq!(sprite.element.rest, Transform2D::IDENTITY);
        assert_eq!(sprite.element.animation, None);
    }

    #[test]
    fn test_delete_middle_sprite() {
        let mut store = store_with_sprites(&["A", "B", "C"]);
        let removed = store.delete_sprite(0, 1).unwrap();

        assert_eq!(removed.element.image, "B");
        assert_eq!(images(&store, 0), vec!["A", "C"]);
        let sprites = &store.frame(0).unwrap().sprites;
        assert_eq!(sprites.count(), 2);
        assert_eq!(sprites.labels(), vec!["Sprite: 0", "Sprite: 1"]);
    }

    #[test]
    fn test_rejected_edits_leave_store_unchanged() {
        let (mut store, events) = recording_store();
        store.add_frame();
        store.add_sprite(0, "A").unwrap();
        let before = store.document().clone();
        events.lock().unwrap().clear();

        assert_eq!(store.delete_sprite(0, 5), Err(EditError::NoSuchSprite { frame: 0, slot: 5 }));
        assert_eq!(store.duplicate_sprite(2, 0), Err(EditError::NoSuchFrame(2)));
        assert_eq!(
            store.reorder_sprites(0, &["Sprite: 9"]),
            Err(EditError::ReorderMismatch {
                frame: 0,
                expected: 1
            })
        );
        assert_eq!(
            store.set_animation_duration(0, ElementKey::Background, 10),
            Err(EditError::NotAnimated {
                frame: 0,
                element: ElementKey::Background
            })
        );
        assert_eq!(
            store.set_emotion_portrait(0, "x.png"),
            Err(EditError::EmotionDisabled { frame: 0 })
        );
        assert_eq!(
            store.set_image(0, ElementKey::Sprite(3), "x.png"),
            Err(EditError::NoSuchSprite { frame: 0, slot: 3 })
        );

        assert_eq!(store.document(), &before);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let (mut store, events) = recording_store();
        store.add_frame();
        store
            .set_animation_enabled(0, ElementKey::Background, true)
            .unwrap();
        store.set_emotion_enabled(0, true).unwrap();
        let before = store.document().clone();
        events.lock().unwrap().clear();

        let bad = Vec2::new(f64::NAN, f64::INFINITY);
        let rejected = EditError::NonFinite { frame: 0 };
        assert_eq!(
            store.set_rest_position(0, ElementKey::Background, bad),
            Err(rejected.clone())
        );
        assert_eq!(
            store.set_rest_scale(0, ElementKey::Background, bad),
            Err(rejected.clone())
        );
        assert_eq!(
            store.set_animation_target_position(0, ElementKey::Background, bad),
            Err(rejected.clone())
        );
        assert_eq!(
            store.set_animation_target_scale(0, ElementKey::Background, bad),
            Err(rejected.clone())
        );
        assert_eq!(store.set_emotion_position(0, bad), Err(rejected.clone()));
        assert_eq!(store.set_emotion_scale(0, bad), Err(rejected));

        assert_eq!(store.document(), &before);
        assert!(events.lock().unwrap().is_empty());
        assert!(crate::codec::to_json_vec(store.document()).is_ok());
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut store = store_with_sprites(&["A"]);
        store
            .set_animation_enabled(0, ElementKey::Sprite(0), true)
            .unwrap();
        let copy = store.duplicate_sprite(0, 0).unwrap();

        store
            .set_rest_position(0, ElementKey::Sprite(copy), Vec2::new(5.0, 5.0))
            .unwrap();
        store
            .set_animation_duration(0, ElementKey::Sprite(copy), 900)
            .unwrap();

        let original = &store.frame(0).unwrap().sprites.get(0).unwrap().element;
        assert_eq!(original.rest.position, Vec2::ZERO);
        assert_eq!(original.animation.map(|a| a.duration_ms), Some(0));
    }

    #[test]
    fn test_reorder_sprites() {
        let mut store = store_with_sprites(&["A", "B", "C"]);
        store
            .reorder_sprites(0, &["Sprite: 1", "Sprite: 2", "Sprite: 0"])
            .unwrap();
        assert_eq!(images(&store, 0), vec!["B", "C", "A"]);
        assert_eq!(store.frame(0).unwrap().sprites.count(), 3);
    }

    #[test]
    fn test_animation_toggle_and_edits() {
        let (mut store, events) = recording_store();
        store.add_frame();
        store
            .set_rest_position(0, ElementKey::Background, Vec2::new(0.0, 300.0))
            .unwrap();
        events.lock().unwrap().clear();

        assert_eq!(
            store.set_animation_enabled(0, ElementKey::Background, true),
            Ok(true)
        );
        assert_eq!(
            store.set_animation_enabled(0, ElementKey::Background, true),
            Ok(false)
        );
        store
            .set_animation_duration(0, ElementKey::Background, 2000)
            .unwrap();
        store
            .set_animation_target_position(0, ElementKey::Background, Vec2::new(500.0, 300.0))
            .unwrap();
        store
            .set_animation_target_scale(0, ElementKey::Background, Vec2::new(2.0, 2.0))
            .unwrap();

        let background = &store.frame(0).unwrap().background;
        assert_eq!(
            background.animation,
            Some(AnimationDescriptor::new(
                2000,
                Transform2D::new(Vec2::new(500.0, 300.0), Vec2::new(2.0, 2.0))
            ))
        );
        assert_eq!(background.rest.position, Vec2::new(0.0, 300.0));
        assert_eq!(events.lock().unwrap().len(), 4);

        store
            .set_animation_enabled(0, ElementKey::Background, false)
            .unwrap();
        assert_eq!(store.frame(0).unwrap().background.animation, None);
    }

    #[test]
    fn test_text_and_ui_edits() {
        let mut store = SceneStore::new();
        store.add_frame();
        store.set_character_name(0, "Makishiro").unwrap();
        store.set_dialogue(0, "Good evening.").unwrap();
        store.set_time_of_day(0, TimeOfDay::Night).unwrap();
        store.set_chapter(0, "Chapter 1").unwrap();

        let frame = store.frame(0).unwrap();
        assert_eq!(frame.text.character_name, "Makishiro");
        assert_eq!(frame.text.dialogue, "Good evening.");
        assert_eq!(frame.ui.time_of_day, TimeOfDay::Night);
        assert_eq!(frame.ui.chapter, "Chapter 1");
    }

    #[test]
    fn test_inherit_chapter() {
        let mut store = SceneStore::new();
        store.add_frame();
        store.add_frame();
        store.add_frame();
        store.set_chapter(0, "Prologue").unwrap();
        store.set_chapter(2, "Interlude").unwrap();

        assert_eq!(store.inherit_chapter(0), Ok(false));
        assert_eq!(store.inherit_chapter(1), Ok(true));
        assert_eq!(store.frame(1).unwrap().ui.chapter, "Prologue");
        assert_eq!(store.inherit_chapter(2), Ok(false));
        assert_eq!(store.frame(2).unwrap().ui.chapter, "Interlude");
        assert_eq!(store.inherit_chapter(7), Err(EditError::NoSuchFrame(7)));
    }

    #[test]
    fn test_emotion_overlay_lifecycle() {
        let mut store = SceneStore::new();
        store.add_frame();

        assert_eq!(store.set_emotion_enabled(0, true), Ok(true));
        store.set_emotion_portrait(0, "smile.png").unwrap();
        store.set_emotion_background(0, "frame.png").unwrap();
        store.set_emotion_position(0, Vec2::new(10.0, 20.0)).unwrap();
        store.set_emotion_scale(0, Vec2::new(0.5, 0.5)).unwrap();

        let emotion = store.frame(0).unwrap().ui.emotion.clone().unwrap();
        assert_eq!(emotion.portrait, "smile.png");
        assert_eq!(
            emotion.background_transform,
            Transform2D::new(Vec2::new(10.0, 20.0), Vec2::new(0.5, 0.5))
        );

        assert_eq!(store.set_emotion_enabled(0, false), Ok(true));
        assert_eq!(store.set_emotion_enabled(0, true), Ok(true));
        assert_eq!(
            store.frame(0).unwrap().ui.emotion,
            Some(EmotionOverlay::default())
        );
    }

    #[test]
    fn test_replace_emits_document_event() {
        let (mut store, events) = recording_store();
        store.add_frame();
        let previous = store.replace(SceneDocument::new());

        assert_eq!(previous.len(), 1);
        assert!(store.document().is_empty());
        assert_eq!(
            events.lock().unwrap().last(),
            Some(&ChangeEvent::DocumentReplaced)
        );
    }

    #[test]
    fn test_kind_subscription() {
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        let mut store = SceneStore::new();
        let id = store.subscribe_kind(ChangeKind::Structure, move |_| {
            *count_clone.lock().unwrap() += 1;
        });

        store.add_frame();
        store.add_sprite(0, "a.png").unwrap();
        store.set_dialogue(0, "...").unwrap();
        assert_eq!(*count.lock().unwrap(), 2);

        assert!(store.unsubscribe(id));
        store.add_frame();
        assert_eq!(*count.lock().unwrap(), 2);
    }
}
