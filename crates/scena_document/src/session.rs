//! Editing session
//!
//! A [`Session`] is the explicit context every editor action runs against:
//! the store, the file it came from, whether it has unsaved edits, which
//! frame is active, and the preview timeline for that frame.
//!
//! Playback tracks elements by slot. Once the active frame's sprites are
//! restructured, or the document is replaced, those slots no longer name the
//! same sprites: every element renders at rest and the next tick stops.

use crate::error::{DocumentError, EditError, EditResult, Result};
use crate::io;
use crate::model::SceneDocument;
use crate::store::SceneStore;
use scena_animation::{Easing, TickOutcome, TimelineController};
use scena_core::{ChangeEvent, ElementKey, PlaybackState, Transform2D};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Session {
    store: SceneStore,
    path: Option<PathBuf>,
    dirty: Arc<AtomicBool>,
    /// Mirrors `active_frame` for the change subscriber
    watched_frame: Arc<AtomicUsize>,
    /// Set when playback slots no longer match the document
    slots_stale: Arc<AtomicBool>,
    active_frame: usize,
    timeline: TimelineController,
}

impl Session {
    /// Start a session on an empty, unsaved document
    pub fn new() -> Self {
        Self::with_easing(Easing::default())
    }

    pub fn with_easing(easing: Easing) -> Self {
        let dirty = Arc::new(AtomicBool::new(false));
        let watched_frame = Arc::new(AtomicUsize::new(0));
        let slots_stale = Arc::new(AtomicBool::new(false));
        let mut store = SceneStore::new();

        let flag = dirty.clone();
        store.subscribe(move |event| {
            if event.is_edit() {
                flag.store(true, Ordering::Relaxed);
            }
        });

        let watched = watched_frame.clone();
        let stale = slots_stale.clone();
        store.subscribe(move |event| match *event {
            ChangeEvent::DocumentReplaced => stale.store(true, Ordering::Relaxed),
            ChangeEvent::SpritesRestructured { frame }
                if frame == watched.load(Ordering::Relaxed) =>
            {
                stale.store(true, Ordering::Relaxed)
            }
            _ => {}
        });

        Self {
            store,
            path: None,
            dirty,
            watched_frame,
            slots_stale,
            active_frame: 0,
            timeline: TimelineController::with_easing(easing),
        }
    }

    /// Open `path` in a new session
    pub fn load(path: impl AsRef<Path>, easing: Easing) -> Result<Self> {
        let mut session = Self::with_easing(easing);
        session.open(path)?;
        Ok(session)
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    /// Mutable access for edit operations
    pub fn store_mut(&mut self) -> &mut SceneStore {
        &mut self.store
    }

    pub fn document(&self) -> &SceneDocument {
        self.store.document()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether edits were made since the last open or save
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Replace the document with the one stored at `path`.
    ///
    /// On error the current document, path and dirty flag are untouched.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let document = io::load(path)?;

        self.stop();
        self.store.replace(document);
        self.path = Some(path.to_path_buf());
        self.set_active(0);
        self.dirty.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Write the document back to the path it was opened from or last saved to
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or(DocumentError::NoPath)?;
        io::save(self.store.document(), &path)?;
        self.dirty.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Write the document to `path` and make it the current path
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        io::save(self.store.document(), &path)?;
        info!(path = %path.display(), "session path changed");
        self.path = Some(path);
        self.dirty.store(false, Ordering::Relaxed);
        Ok(())
    }

    // =========================================================================
    // Active frame
    // =========================================================================

    pub fn active_frame(&self) -> usize {
        self.active_frame
    }

    /// Make `frame` the active frame, stopping any playback first
    pub fn select_frame(&mut self, frame: usize) -> EditResult<()> {
        if self.store.frame(frame).is_none() {
            return Err(EditError::NoSuchFrame(frame));
        }
        self.stop();
        self.set_active(frame);
        debug!(frame, "active frame selected");
        Ok(())
    }

    fn set_active(&mut self, frame: usize) {
        self.active_frame = frame;
        self.watched_frame.store(frame, Ordering::Relaxed);
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.timeline.state()
    }

    pub fn is_playing(&self) -> bool {
        self.timeline.is_running()
    }

    /// Start previewing the active frame now
    pub fn play(&mut self) -> bool {
        self.play_at(Instant::now())
    }

    /// Start previewing the active frame with `epoch` as the clock origin.
    ///
    /// The frame's rest state is snapshotted here; edits made while running
    /// do not affect the playback in flight. Returns false when already
    /// running or when there is no active frame.
    pub fn play_at(&mut self, epoch: Instant) -> bool {
        let Some(frame) = self.store.frame(self.active_frame) else {
            return false;
        };
        if !self.timeline.start_at(frame.element_states(), epoch) {
            return false;
        }
        self.slots_stale.store(false, Ordering::Relaxed);
        self.store.notify(ChangeEvent::PlaybackStarted {
            frame: self.active_frame,
        });
        true
    }

    /// Advance playback to `now`.
    ///
    /// If the active frame's sprites were restructured or the document was
    /// replaced since `play`, playback stops instead and `Idle` is returned.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.slots_stale.load(Ordering::Relaxed) && self.timeline.is_running() {
            debug!(frame = self.active_frame, "sprites restructured; stopping playback");
            self.stop();
            return TickOutcome::Idle;
        }
        let outcome = self.timeline.tick(now);
        if outcome == TickOutcome::Completed {
            self.store.notify(ChangeEvent::PlaybackFinished {
                frame: self.active_frame,
            });
        }
        outcome
    }

    /// Cancel playback; every element renders at rest again
    pub fn stop(&mut self) {
        if !self.timeline.is_running() {
            return;
        }
        self.timeline.stop();
        self.store.notify(ChangeEvent::PlaybackStopped {
            frame: self.active_frame,
        });
    }

    /// Position and scale to draw for `key` in the active frame
    pub fn rendered(&self, key: ElementKey) -> Option<Transform2D> {
        let element = self.store.frame(self.active_frame)?.element(key)?;
        if self.slots_stale.load(Ordering::Relaxed) {
            return Some(element.rest);
        }
        Some(self.timeline.resolve(key, element.rest))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scena_core::Vec2;
    use std::sync::Mutex;
    use std::time::Duration;

    fn animated_session() -> Session {
        let mut session = Session::new();
        let store = session.store_mut();
        let frame = store.add_frame();
        store
            .set_rest_position(frame, ElementKey::Background, Vec2::new(0.0, 300.0))
            .unwrap();
        store
            .set_animation_enabled(frame, ElementKey::Background, true)
            .unwrap();
        store
            .set_animation_duration(frame, ElementKey::Background, 2000)
            .unwrap();
        store
            .set_animation_target_position(frame, ElementKey::Background, Vec2::new(500.0, 300.0))
            .unwrap();
        session
    }

    #[test]
    fn test_edits_mark_dirty() {
        let mut session = Session::new();
        assert!(!session.is_dirty());
        session.store_mut().add_frame();
        assert!(session.is_dirty());
    }

    #[test]
    fn test_playback_does_not_mark_dirty() {
        let mut session = animated_session();
        session.dirty.store(false, Ordering::Relaxed);

        let epoch = Instant::now();
        assert!(session.play_at(epoch));
        session.tick(epoch + Duration::from_millis(500));
        session.stop();
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_rendered_follows_playback() {
        let mut session = animated_session();
        let epoch = Instant::now();
        session.play_at(epoch);

        session.tick(epoch + Duration::from_millis(1000));
        assert_eq!(
            session.rendered(ElementKey::Background).map(|t| t.position),
            Some(Vec2::new(250.0, 300.0))
        );

        session.stop();
        assert_eq!(
            session.rendered(ElementKey::Background).map(|t| t.position),
            Some(Vec2::new(0.0, 300.0))
        );
    }

    #[test]
    fn test_edits_during_playback_do_not_reach_running_preview() {
        let mut session = animated_session();
        let epoch = Instant::now();
        session.play_at(epoch);

        session
            .store_mut()
            .set_animation_target_position(0, ElementKey::Background, Vec2::new(-500.0, 0.0))
            .unwrap();
        session.tick(epoch + Duration::from_millis(1000));
        assert_eq!(
            session.rendered(ElementKey::Background).map(|t| t.position),
            Some(Vec2::new(250.0, 300.0))
        );
    }

    #[test]
    fn test_completion_emits_finished() {
        let mut session = animated_session();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        session
            .store_mut()
            .subscribe_kind(scena_core::ChangeKind::Playback, move |event| {
                events_clone.lock().unwrap().push(event.clone())
            });

        let epoch = Instant::now();
        session.play_at(epoch);
        assert_eq!(
            session.tick(epoch + Duration::from_millis(2000)),
            TickOutcome::Completed
        );
        session.stop();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                ChangeEvent::PlaybackStarted { frame: 0 },
                ChangeEvent::PlaybackFinished { frame: 0 }
            ]
        );
    }

    fn sprites_a_and_c() -> Session {
        let mut session = Session::new();
        let store = session.store_mut();
        store.add_frame();
        store.add_sprite(0, "A").unwrap();
        store.add_sprite(0, "C").unwrap();
        store
            .set_animation_enabled(0, ElementKey::Sprite(0), true)
            .unwrap();
        store
            .set_animation_duration(0, ElementKey::Sprite(0), 1000)
            .unwrap();
        store
            .set_animation_target_position(0, ElementKey::Sprite(0), Vec2::new(100.0, 0.0))
            .unwrap();
        store
            .set_rest_position(0, ElementKey::Sprite(1), Vec2::new(7.0, 7.0))
            .unwrap();
        session
    }

    #[test]
    fn test_delete_during_playback_renders_rest_and_stops() {
        let mut session = sprites_a_and_c();
        let epoch = Instant::now();
        session.play_at(epoch);
        session.tick(epoch + Duration::from_millis(500));

        session.store_mut().delete_sprite(0, 0).unwrap();
        let rest_c = Transform2D::IDENTITY.with_position(Vec2::new(7.0, 7.0));
        assert_eq!(session.rendered(ElementKey::Sprite(0)), Some(rest_c));

        assert_eq!(
            session.tick(epoch + Duration::from_millis(600)),
            TickOutcome::Idle
        );
        assert!(!session.is_playing());
        assert_eq!(session.rendered(ElementKey::Sprite(0)), Some(rest_c));
    }

    #[test]
    fn test_reorder_during_playback_stops() {
        let mut session = sprites_a_and_c();
        let epoch = Instant::now();
        session.play_at(epoch);
        session.tick(epoch + Duration::from_millis(300));

        session
            .store_mut()
            .reorder_sprites(0, &["Sprite: 1", "Sprite: 0"])
            .unwrap();
        assert_eq!(
            session.rendered(ElementKey::Sprite(0)).map(|t| t.position),
            Some(Vec2::new(7.0, 7.0))
        );
        assert_eq!(
            session.tick(epoch + Duration::from_millis(400)),
            TickOutcome::Idle
        );
    }

    #[test]
    fn test_replace_during_playback_stops() {
        let mut session = sprites_a_and_c();
        let epoch = Instant::now();
        session.play_at(epoch);
        session.store_mut().replace(SceneDocument::new());

        assert_eq!(session.tick(epoch), TickOutcome::Idle);
        assert!(!session.is_playing());
    }

    #[test]
    fn test_other_frame_edits_keep_playing() {
        let mut session = sprites_a_and_c();
        let other = session.store_mut().add_frame();
        let epoch = Instant::now();
        session.play_at(epoch);

        session.store_mut().add_sprite(other, "B").unwrap();
        assert_eq!(
            session.tick(epoch + Duration::from_millis(500)),
            TickOutcome::Running
        );

        session.stop();
        session.store_mut().delete_sprite(0, 1).unwrap();
        assert!(session.play_at(epoch));
        assert_eq!(
            session.tick(epoch + Duration::from_millis(500)),
            TickOutcome::Running
        );
        assert_eq!(
            session.rendered(ElementKey::Sprite(0)).map(|t| t.position),
            Some(Vec2::new(50.0, 0.0))
        );
    }

    #[test]
    fn test_play_without_frames() {
        let mut session = Session::new();
        assert!(!session.play());
        assert_eq!(session.rendered(ElementKey::Background), None);
    }

    #[test]
    fn test_select_frame_stops_playback() {
        let mut session = animated_session();
        session.store_mut().add_frame();
        session.play();
        assert!(session.is_playing());

        assert_eq!(session.select_frame(1), Ok(()));
        assert!(!session.is_playing());
        assert_eq!(session.active_frame(), 1);
        assert_eq!(session.select_frame(4), Err(EditError::NoSuchFrame(4)));
        assert_eq!(session.active_frame(), 1);
    }

    #[test]
    fn test_save_without_path() {
        let mut session = Session::new();
        assert!(matches!(session.save(), Err(DocumentError::NoPath)));
    }
}
