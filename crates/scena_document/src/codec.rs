//! JSON wire format
//!
//! The persisted document maps stringified frame indices to frame objects.
//! Wire records are decoded with serde and validated once, here; the rest
//! of the crate only sees the typed model.
//!
//! ```text
//! {
//!     "0": {
//!         "background": { "name", "position", "scale", "animation", "animationSettings"? },
//!         "text": { "charaName", "text" },
//!         "ui": { "time", "chapter", "emotion", "charaEmotion", ... },
//!         "sprite": { "count": n, "0": { "spriteId", "name", ... }, ... }
//!     }
//! }
//! ```

use crate::error::{DocumentError, Result};
use crate::model::{
    sprite_label, Element, EmotionOverlay, Frame, SceneDocument, Sprite, SpriteCollection,
    TextRecord, TimeOfDay, UiOverlay,
};
use scena_core::{AnimationDescriptor, ElementKey, Transform2D, Vec2};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const INDENT: &[u8] = b"    ";

fn default_scale() -> Vec2 {
    Vec2::ONE
}

#[derive(Debug, Serialize, Deserialize)]
struct WireAnimation {
    time: u64,
    position: Vec2,
    scale: Vec2,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireBackground {
    name: String,
    position: Vec2,
    scale: Vec2,
    #[serde(default)]
    animation: bool,
    #[serde(
        rename = "animationSettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    animation_settings: Option<WireAnimation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireSprite {
    #[serde(rename = "spriteId", alias = "objectName", default)]
    sprite_id: String,
    name: String,
    position: Vec2,
    scale: Vec2,
    #[serde(default)]
    animation: bool,
    #[serde(
        rename = "animationSettings",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    animation_settings: Option<WireAnimation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireText {
    #[serde(rename = "charaName", default)]
    chara_name: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireUi {
    #[serde(default)]
    time: String,
    #[serde(default)]
    chapter: String,
    #[serde(default)]
    emotion: bool,
    #[serde(rename = "charaEmotion", default)]
    chara_emotion: String,
    #[serde(rename = "charaEmotionBackground", default)]
    chara_emotion_background: String,
    #[serde(rename = "charaEmotionBackgroundPosition", default)]
    chara_emotion_background_position: Vec2,
    #[serde(rename = "charaEmotionBackgroundScale", default = "default_scale")]
    chara_emotion_background_scale: Vec2,
}

/// Sprite table as read: `count` plus slot-keyed entries
#[derive(Debug, Deserialize)]
struct WireSpritesIn {
    count: usize,
    #[serde(flatten)]
    slots: BTreeMap<String, WireSprite>,
}

/// Sprite table as written, slots in ascending order
struct WireSpritesOut<'a>(&'a SpriteCollection);

#[derive(Debug, Serialize, Deserialize)]
struct WireFrame<S> {
    background: WireBackground,
    text: WireText,
    ui: WireUi,
    #[serde(alias = "sprites")]
    sprite: S,
}

/// Whole document as written, frames in ascending order
struct WireDocumentOut<'a>(&'a SceneDocument);

fn descriptor_from_wire(
    frame: usize,
    element: ElementKey,
    rest: Transform2D,
    enabled: bool,
    settings: Option<WireAnimation>,
) -> Option<AnimationDescriptor> {
    match (enabled, settings) {
        (true, Some(settings)) => Some(AnimationDescriptor::new(
            settings.time,
            Transform2D::new(settings.position, settings.scale),
        )),
        (true, None) => {
            warn!(frame, %element, "animation enabled without settings; using rest values");
            Some(AnimationDescriptor::at_rest(rest))
        }
        (false, Some(_)) => {
            warn!(
                frame,
                %element,
                "animation settings present but animation is off; dropping them"
            );
            None
        }
        (false, None) => None,
    }
}

fn descriptor_to_wire(animation: Option<&AnimationDescriptor>) -> Option<WireAnimation> {
    animation.map(|a| WireAnimation {
        time: a.duration_ms,
        position: a.target.position,
        scale: a.target.scale,
    })
}

/// Parse a canonical decimal index ("0", "12"; not "01" or "+1")
fn parse_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

impl WireBackground {
    fn into_element(self, frame: usize) -> Element {
        let rest = Transform2D::new(self.position, self.scale);
        let animation = descriptor_from_wire(
            frame,
            ElementKey::Background,
            rest,
            self.animation,
            self.animation_settings,
        );
        Element {
            image: self.name,
            rest,
            animation,
        }
    }

    fn from_element(element: &Element) -> Self {
        Self {
            name: element.image.clone(),
            position: element.rest.position,
            scale: element.rest.scale,
            animation: element.is_animated(),
            animation_settings: descriptor_to_wire(element.animation.as_ref()),
        }
    }
}

impl WireSprite {
    fn into_sprite(self, frame: usize, slot: usize) -> Sprite {
        let rest = Transform2D::new(self.position, self.scale);
        let animation = descriptor_from_wire(
            frame,
            ElementKey::Sprite(slot),
            rest,
            self.animation,
            self.animation_settings,
        );
        let label = if self.sprite_id.is_empty() {
            sprite_label(slot)
        } else {
            self.sprite_id
        };
        Sprite {
            label,
            element: Element {
                image: self.name,
                rest,
                animation,
            },
        }
    }

    fn from_sprite(sprite: &Sprite) -> Self {
        Self {
            sprite_id: sprite.label.clone(),
            name: sprite.element.image.clone(),
            position: sprite.element.rest.position,
            scale: sprite.element.rest.scale,
            animation: sprite.element.is_animated(),
            animation_settings: descriptor_to_wire(sprite.element.animation.as_ref()),
        }
    }
}

impl WireSpritesIn {
    fn into_collection(self, frame: usize) -> Result<SpriteCollection> {
        if self.count != self.slots.len() {
            return Err(DocumentError::SpriteCount {
                frame,
                count: self.count,
                found: self.slots.len(),
            });
        }

        let mut by_slot = BTreeMap::new();
        for (key, sprite) in self.slots {
            let slot = parse_index(&key).ok_or(DocumentError::SpriteKey { frame, key })?;
            by_slot.insert(slot, sprite);
        }

        let mut entries = Vec::with_capacity(by_slot.len());
        for (expected, (slot, sprite)) in by_slot.into_iter().enumerate() {
            if slot != expected {
                return Err(DocumentError::MissingSprite {
                    frame,
                    slot: expected,
                });
            }
            entries.push(sprite.into_sprite(frame, slot));
        }
        Ok(SpriteCollection::from_sprites(entries))
    }
}

impl Serialize for WireSpritesOut<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.count() + 1))?;
        map.serialize_entry("count", &self.0.count())?;
        for (slot, sprite) in self.0.iter().enumerate() {
            map.serialize_entry(&slot.to_string(), &WireSprite::from_sprite(sprite))?;
        }
        map.end()
    }
}

impl WireText {
    fn into_record(self) -> TextRecord {
        TextRecord {
            character_name: self.chara_name,
            dialogue: self.text,
        }
    }

    fn from_record(text: &TextRecord) -> Self {
        Self {
            chara_name: text.character_name.clone(),
            text: text.dialogue.clone(),
        }
    }
}

impl WireUi {
    fn into_overlay(self, frame: usize) -> UiOverlay {
        let time_of_day = TimeOfDay::from_label(&self.time).unwrap_or_else(|| {
            warn!(frame, time = %self.time, "unknown time of day; leaving it unset");
            TimeOfDay::Unset
        });
        let emotion = self.emotion.then(|| EmotionOverlay {
            portrait: self.chara_emotion,
            background: self.chara_emotion_background,
            background_transform: Transform2D::new(
                self.chara_emotion_background_position,
                self.chara_emotion_background_scale,
            ),
        });
        UiOverlay {
            time_of_day,
            chapter: self.chapter,
            emotion,
        }
    }

    fn from_overlay(ui: &UiOverlay) -> Self {
        let emotion = ui.emotion.clone().unwrap_or_default();
        Self {
            time: ui.time_of_day.as_str().to_string(),
            chapter: ui.chapter.clone(),
            emotion: ui.emotion.is_some(),
            chara_emotion: emotion.portrait,
            chara_emotion_background: emotion.background,
            chara_emotion_background_position: emotion.background_transform.position,
            chara_emotion_background_scale: emotion.background_transform.scale,
        }
    }
}

impl WireFrame<WireSpritesIn> {
    fn into_frame(self, frame: usize) -> Result<Frame> {
        Ok(Frame {
            background: self.background.into_element(frame),
            text: self.text.into_record(),
            ui: self.ui.into_overlay(frame),
            sprites: self.sprite.into_collection(frame)?,
        })
    }
}

impl<'a> WireFrame<WireSpritesOut<'a>> {
    fn from_frame(frame: &'a Frame) -> Self {
        Self {
            background: WireBackground::from_element(&frame.background),
            text: WireText::from_record(&frame.text),
            ui: WireUi::from_overlay(&frame.ui),
            sprite: WireSpritesOut(&frame.sprites),
        }
    }
}

impl Serialize for WireDocumentOut<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, frame) in self.0.frames().iter().enumerate() {
            map.serialize_entry(&index.to_string(), &WireFrame::from_frame(frame))?;
        }
        map.end()
    }
}

/// Decode a document from JSON bytes.
///
/// Either the whole document is valid and returned, or an error is.
pub fn from_json_slice(bytes: &[u8]) -> Result<SceneDocument> {
    let wire: BTreeMap<String, WireFrame<WireSpritesIn>> = serde_json::from_slice(bytes)?;

    let mut by_index = BTreeMap::new();
    for (key, frame) in wire {
        let index = parse_index(&key).ok_or(DocumentError::FrameKey(key))?;
        by_index.insert(index, frame);
    }

    let mut frames = Vec::with_capacity(by_index.len());
    for (expected, (index, frame)) in by_index.into_iter().enumerate() {
        if index != expected {
            return Err(DocumentError::MissingFrame(expected));
        }
        frames.push(frame.into_frame(index)?);
    }
    Ok(SceneDocument::from_frames(frames))
}

/// Index of the first frame holding a NaN or infinite coordinate
fn first_non_finite(document: &SceneDocument) -> Option<usize> {
    document.frames().iter().position(|frame| {
        let elements = frame.element_states().any(|state| {
            !state.rest.is_finite() || state.animation.is_some_and(|a| !a.target.is_finite())
        });
        let emotion = frame
            .ui
            .emotion
            .as_ref()
            .is_some_and(|e| !e.background_transform.is_finite());
        elements || emotion
    })
}

/// Encode a document as UTF-8 JSON with 4-space indentation.
///
/// Fails on NaN or infinite coordinates, which JSON cannot represent.
pub fn to_json_vec(document: &SceneDocument) -> Result<Vec<u8>> {
    if let Some(frame) = first_non_finite(document) {
        return Err(DocumentError::NonFinite(frame));
    }
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    WireDocumentOut(document).serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}
