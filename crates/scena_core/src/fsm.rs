//! Playback State Machine
//!
//! Flat two-state machine driving animated preview:
//!
//! - `Start` is only honoured from `Idle`
//! - `Stop` is honoured from either state
//! - `Complete` is raised by the timeline once every element reached its target
//!
//! Events with no matching transition leave the state unchanged.

use tracing::debug;

/// Lifecycle state of a preview
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    #[default]
    Idle,
    Running,
}

/// Events accepted by [`PlaybackMachine`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackEvent {
    Start,
    Stop,
    Complete,
}

/// A transition in the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from_state: PlaybackState,
    pub event: PlaybackEvent,
    pub to_state: PlaybackState,
}

impl Transition {
    pub const fn new(from: PlaybackState, event: PlaybackEvent, to: PlaybackState) -> Self {
        Self {
            from_state: from,
            event,
            to_state: to,
        }
    }
}

const TRANSITIONS: [Transition; 4] = [
    Transition::new(PlaybackState::Idle, PlaybackEvent::Start, PlaybackState::Running),
    Transition::new(PlaybackState::Running, PlaybackEvent::Stop, PlaybackState::Idle),
    Transition::new(PlaybackState::Running, PlaybackEvent::Complete, PlaybackState::Idle),
    Transition::new(PlaybackState::Idle, PlaybackEvent::Stop, PlaybackState::Idle),
];

/// Number of transitions kept for inspection
const HISTORY_LIMIT: usize = 32;

/// The playback state machine instance
#[derive(Clone, Debug, Default)]
pub struct PlaybackMachine {
    current_state: PlaybackState,
    /// Most recent transitions, oldest first
    history: Vec<(PlaybackState, PlaybackEvent, PlaybackState)>,
}

impl PlaybackMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn current_state(&self) -> PlaybackState {
        self.current_state
    }

    /// Check if we're in a specific state
    pub fn is_in(&self, state: PlaybackState) -> bool {
        self.current_state == state
    }

    /// Get transition history
    pub fn history(&self) -> &[(PlaybackState, PlaybackEvent, PlaybackState)] {
        &self.history
    }

    /// Check if an event can trigger a transition from the current state
    pub fn can_send(&self, event: PlaybackEvent) -> bool {
        self.find(event).is_some()
    }

    /// Send an event, returning the resulting state
    pub fn send(&mut self, event: PlaybackEvent) -> PlaybackState {
        let current = self.current_state;
        let Some(transition) = self.find(event) else {
            return current;
        };

        self.current_state = transition.to_state;
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push((current, event, transition.to_state));
        debug!(from = ?current, ?event, to = ?transition.to_state, "playback transition");

        transition.to_state
    }

    fn find(&self, event: PlaybackEvent) -> Option<&'static Transition> {
        TRANSITIONS
            .iter()
            .find(|t| t.from_state == self.current_state && t.event == event)
    }
}
