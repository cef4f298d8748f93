//! Timeline playback for one frame
//!
//! `start` snapshots the rest state of the frame's animated elements, so
//! edits made to the document while running never reach the playback in
//! flight. Each `tick` evaluates every tracked element against the same
//! elapsed snapshot and writes the result into a [`TransientView`].

use crate::easing::Easing;
use crate::interpolate::{interpolate, progress};
use crate::transient::TransientView;
use scena_core::{
    AnimationDescriptor, ElementKey, ElementState, PlaybackEvent, PlaybackMachine, PlaybackState,
    Transform2D,
};
use smallvec::SmallVec;
use std::time::{Duration, Instant};
use tracing::debug;

/// An animated element captured at `start`
#[derive(Clone, Copy, Debug)]
struct Track {
    key: ElementKey,
    rest: Transform2D,
    animation: AnimationDescriptor,
}

impl Track {
    fn is_done(&self, elapsed: Duration) -> bool {
        elapsed >= Duration::from_millis(self.animation.duration_ms)
    }
}

/// Result of a single [`TimelineController::tick`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The controller was not running; nothing was computed
    Idle,
    /// Values were updated and at least one element is still moving
    Running,
    /// Every element reached its target; the controller is idle again
    Completed,
}

/// Drives animated preview of a single frame
#[derive(Debug)]
pub struct TimelineController {
    machine: PlaybackMachine,
    easing: Easing,
    epoch: Option<Instant>,
    tracks: SmallVec<[Track; 8]>,
    transient: TransientView,
}

impl TimelineController {
    pub fn new() -> Self {
        Self::with_easing(Easing::default())
    }

    pub fn with_easing(easing: Easing) -> Self {
        Self {
            machine: PlaybackMachine::new(),
            easing,
            epoch: None,
            tracks: SmallVec::new(),
            transient: TransientView::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.machine.current_state()
    }

    pub fn is_running(&self) -> bool {
        self.machine.is_in(PlaybackState::Running)
    }

    /// Number of animated elements in the current playback
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Start playback now. See [`TimelineController::start_at`].
    pub fn start<I>(&mut self, elements: I) -> bool
    where
        I: IntoIterator<Item = ElementState>,
    {
        self.start_at(elements, Instant::now())
    }

    /// Start playback with `epoch` as the elapsed-clock origin.
    ///
    /// Only elements carrying an animation descriptor are tracked. Returns
    /// false, leaving the running playback untouched, if already running.
    pub fn start_at<I>(&mut self, elements: I, epoch: Instant) -> bool
    where
        I: IntoIterator<Item = ElementState>,
    {
        if !self.machine.can_send(PlaybackEvent::Start) {
            return false;
        }

        self.tracks = elements
            .into_iter()
            .filter_map(|element| {
                element.animation.map(|animation| Track {
                    key: element.key,
                    rest: element.rest,
                    animation,
                })
            })
            .collect();
        self.transient.clear();
        self.epoch = Some(epoch);
        self.machine.send(PlaybackEvent::Start);

        debug!(tracks = self.tracks.len(), "timeline started");
        true
    }

    /// Time since `start`, or `None` when idle
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        self.epoch.map(|epoch| now.saturating_duration_since(epoch))
    }

    /// Advance playback to `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let Some(elapsed) = self.elapsed(now) else {
            return TickOutcome::Idle;
        };
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        for track in &self.tracks {
            let eased = self
                .easing
                .apply(progress(elapsed_ms, track.animation.duration_ms));
            let value = interpolate(track.rest, track.animation.target, eased);
            self.transient.insert(track.key, value);
        }

        if self.tracks.iter().all(|track| track.is_done(elapsed)) {
            self.finish(PlaybackEvent::Complete);
            debug!(elapsed_ms, "timeline completed");
            return TickOutcome::Completed;
        }

        TickOutcome::Running
    }

    /// Stop playback and discard every transient value
    pub fn stop(&mut self) {
        self.finish(PlaybackEvent::Stop);
    }

    /// Values computed by the latest tick
    pub fn transient(&self) -> &TransientView {
        &self.transient
    }

    /// Value to render for `key`: its transient value while running, `rest` otherwise
    pub fn resolve(&self, key: ElementKey, rest: Transform2D) -> Transform2D {
        self.transient.resolve(key, rest)
    }

    /// Latest time at which every tracked element will have reached its target
    pub fn total_duration(&self) -> Duration {
        self.tracks
            .iter()
            .map(|track| Duration::from_millis(track.animation.duration_ms))
            .max()
            .unwrap_or_default()
    }

    fn finish(&mut self, event: PlaybackEvent) {
        self.machine.send(event);
        self.tracks.clear();
        self.transient.clear();
        self.epoch = None;
    }
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new()
    }
}
