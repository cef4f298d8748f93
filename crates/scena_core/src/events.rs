//! Change notification
//!
//! Every mutation of the scene document is announced as a [`ChangeEvent`].
//! Renderers and inspectors subscribe to the kinds they care about and
//! re-read state on their own schedule; nothing is re-derived eagerly.

use crate::element::ElementKey;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle returned by [`EventDispatcher::subscribe`]
    pub struct SubscriptionId;
}

/// A change to the document or to playback
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The whole document was replaced (open or new)
    DocumentReplaced,
    FrameAdded { frame: usize },
    /// Sprites were added, duplicated, deleted or reordered
    SpritesRestructured { frame: usize },
    /// Rest values or the image of an element changed
    ElementChanged { frame: usize, element: ElementKey },
    /// An animation descriptor was created, removed or edited
    AnimationChanged { frame: usize, element: ElementKey },
    TextChanged { frame: usize },
    UiChanged { frame: usize },
    PlaybackStarted { frame: usize },
    /// Every animated element reached its target
    PlaybackFinished { frame: usize },
    /// Playback was cancelled before completion
    PlaybackStopped { frame: usize },
}

/// Coarse category of a [`ChangeEvent`], used to filter subscriptions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Document,
    Structure,
    Element,
    Animation,
    Text,
    Ui,
    Playback,
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::DocumentReplaced => ChangeKind::Document,
            ChangeEvent::FrameAdded { .. } | ChangeEvent::SpritesRestructured { .. } => {
                ChangeKind::Structure
            }
            ChangeEvent::ElementChanged { .. } => ChangeKind::Element,
            ChangeEvent::AnimationChanged { .. } => ChangeKind::Animation,
            ChangeEvent::TextChanged { .. } => ChangeKind::Text,
            ChangeEvent::UiChanged { .. } => ChangeKind::Ui,
            ChangeEvent::PlaybackStarted { .. }
            | ChangeEvent::PlaybackFinished { .. }
            | ChangeEvent::PlaybackStopped { .. } => ChangeKind::Playback,
        }
    }

    /// Whether the event reflects a change to persisted data
    pub fn is_edit(&self) -> bool {
        !matches!(self.kind(), ChangeKind::Playback | ChangeKind::Document)
    }

    /// Frame the event refers to, if any
    pub fn frame(&self) -> Option<usize> {
        match *self {
            ChangeEvent::DocumentReplaced => None,
            ChangeEvent::FrameAdded { frame }
            | ChangeEvent::SpritesRestructured { frame }
            | ChangeEvent::ElementChanged { frame, .. }
            | ChangeEvent::AnimationChanged { frame, .. }
            | ChangeEvent::TextChanged { frame }
            | ChangeEvent::UiChanged { frame }
            | ChangeEvent::PlaybackStarted { frame }
            | ChangeEvent::PlaybackFinished { frame }
            | ChangeEvent::PlaybackStopped { frame } => Some(frame),
        }
    }
}

/// Event handler function type
pub type ChangeHandler = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

struct Subscriber {
    filter: Option<ChangeKind>,
    handler: ChangeHandler,
}

/// Dispatches change events to registered subscribers
pub struct EventDispatcher {
    subscribers: SlotMap<SubscriptionId, Subscriber>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            subscribers: SlotMap::with_key(),
        }
    }

    /// Register a handler for every event
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribers.insert(Subscriber {
            filter: None,
            handler: Box::new(handler),
        })
    }

    /// Register a handler for one kind of event
    pub fn subscribe_kind<F>(&mut self, kind: ChangeKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribers.insert(Subscriber {
            filter: Some(kind),
            handler: Box::new(handler),
        })
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    /// Deliver an event to all matching subscribers
    pub fn dispatch(&self, event: &ChangeEvent) {
        let kind = event.kind();
        for (_, subscriber) in self.subscribers.iter() {
            if subscriber.filter.map_or(true, |filter| filter == kind) {
                (subscriber.handler)(event);
            }
        }
    }

    /// Get the number of subscriptions
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Check if there are no subscriptions
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
