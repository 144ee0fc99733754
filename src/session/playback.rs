use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::{Engine, EngineEvent, MediaItem};
use crate::library::{Track, absolute_path, uri_to_path};

use super::cell::StateCell;
use super::publish::{MediaSession, NotificationContent, Notifier};
use super::state::{NowPlaying, PlaybackState, SessionSnapshot};

/// Owns one engine and one media-session handle and keeps them consistent.
///
/// Every method runs on the thread that owns the session; engine callbacks
/// arrive through [`handle_engine_event`](Self::handle_engine_event) on that
/// same thread, so no locking is needed here.
pub struct PlaybackSession<E, M, N> {
    engine: E,
    media: M,
    notifier: N,
    /// Last scan result, used to resolve URIs.
    library: Vec<Track>,
    /// Tracks handed to the engine by the last `load`.
    queue: Vec<Track>,
    current: Option<usize>,
    state: PlaybackState,
    active: bool,
    cell: StateCell<SessionSnapshot>,
}

impl<E: Engine, M: MediaSession, N: Notifier> PlaybackSession<E, M, N> {
    pub fn new(engine: E, media: M, notifier: N) -> Self {
        let mut session = Self {
            engine,
            media,
            notifier,
            library: Vec::new(),
            queue: Vec::new(),
            current: None,
            state: PlaybackState::Idle,
            active: false,
            cell: StateCell::new(SessionSnapshot::default()),
        };
        session.media.set_state(PlaybackState::Idle, Duration::ZERO);
        session
    }

    /// Cell the session writes a [`SessionSnapshot`] into after each transition.
    pub fn state_cell(&self) -> StateCell<SessionSnapshot> {
        self.cell.clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        let index = self.current?;
        let track = self.queue.get(index)?.clone();
        Some(NowPlaying {
            track,
            queue_index: index,
            queue_len: self.queue.len(),
        })
    }

    /// Position in the current track, or zero when nothing is loaded.
    pub fn position(&self) -> Duration {
        if self.current.is_some() {
            self.engine.position()
        } else {
            Duration::ZERO
        }
    }

    /// Replace the library used to resolve URIs. The loaded queue is untouched.
    pub fn set_library(&mut self, tracks: Vec<Track>) {
        self.library = tracks;
    }

    /// Play the library track behind `uri`, queueing the tracks that follow it.
    ///
    /// A missing URI, one that does not parse, or one outside the library is ignored.
    pub fn load(&mut self, uri: Option<&str>) {
        let Some(uri) = uri else {
            debug!("load ignored: no uri");
            return;
        };
        let Some(path) = uri_to_path(uri) else {
            debug!(uri, "load ignored: not a file uri");
            return;
        };
        let Some(start) = self
            .library
            .iter()
            .position(|t| t.path == path || absolute_path(&t.path) == path)
        else {
            debug!(uri, "load ignored: not in library");
            return;
        };

        if self.current.is_some() {
            self.engine.stop();
            self.engine.clear_items();
        }

        self.queue = self.library[start..].to_vec();
        self.current = Some(0);
        info!(title = %self.queue[0].title, queued = self.queue.len(), "loading track");

        self.engine
            .add_items(self.queue.iter().map(MediaItem::from_track).collect());
        self.engine.prepare();
        self.engine.play();

        self.state = PlaybackState::Preparing;
        self.set_active(true);
        self.publish_metadata();
        self.publish(Duration::ZERO);
        self.show_notification();
    }

    /// `Paused` or `Idle` with a loaded queue → `Playing`.
    pub fn play(&mut self) {
        let can_play = match self.state {
            PlaybackState::Paused => true,
            PlaybackState::Idle => !self.queue.is_empty(),
            _ => false,
        };
        if !can_play {
            debug!(state = ?self.state, "play ignored");
            return;
        }

        self.engine.play();
        self.state = PlaybackState::Playing;
        self.set_active(true);
        self.publish(self.position());
        self.show_notification();
    }

    pub fn resume(&mut self) {
        self.play();
    }

    /// `Playing` → `Paused`.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            debug!(state = ?self.state, "pause ignored");
            return;
        }

        self.engine.pause();
        self.state = PlaybackState::Paused;
        self.publish(self.position());
        self.show_notification();
    }

    /// Pause when playing, otherwise play.
    pub fn toggle(&mut self) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Any state → `Stopped`: release the current item, hide the notification
    /// and deactivate the media session.
    pub fn stop(&mut self) {
        self.engine.stop();
        self.engine.clear_items();
        self.queue.clear();
        self.current = None;
        self.state = PlaybackState::Stopped;

        self.notifier.hide();
        self.publish_metadata();
        self.publish(Duration::ZERO);
        self.set_active(false);
    }

    /// Advance within the queue; a no-op on the last item.
    pub fn skip_next(&mut self) {
        let Some(index) = self.current else {
            return;
        };
        if index + 1 < self.queue.len() {
            self.skip_to(index + 1);
        }
    }

    /// Retreat within the queue; a no-op on the first item.
    pub fn skip_previous(&mut self) {
        let Some(index) = self.current else {
            return;
        };
        if index > 0 {
            self.skip_to(index - 1);
        }
    }

    /// Move within the current track, clamped to its duration when known.
    pub fn seek(&mut self, position: Duration) {
        let Some(track) = self.current.and_then(|i| self.queue.get(i)) else {
            return;
        };
        let position = match track.duration {
            Some(d) => position.min(d),
            None => position,
        };

        self.engine.seek_to(position);
        self.publish(position);
    }

    /// Seek by a signed offset in microseconds; negative results clamp to zero.
    pub fn seek_relative(&mut self, offset_micros: i64) {
        let current = self.position();
        let magnitude = Duration::from_micros(offset_micros.unsigned_abs());
        let target = if offset_micros >= 0 {
            current + magnitude
        } else {
            current.saturating_sub(magnitude)
        };
        self.seek(target);
    }

    /// Mirror an engine callback into the session state.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready => {
                if self.state == PlaybackState::Preparing {
                    self.state = PlaybackState::Playing;
                    self.publish(self.position());
                    self.show_notification();
                }
            }
            EngineEvent::IsPlayingChanged(true) => {
                if matches!(self.state, PlaybackState::Preparing | PlaybackState::Paused) {
                    self.state = PlaybackState::Playing;
                    self.publish(self.position());
                    self.show_notification();
                }
            }
            EngineEvent::IsPlayingChanged(false) => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                    self.publish(self.position());
                    self.show_notification();
                }
            }
            EngineEvent::ItemTransition(Some(index)) => {
                if index < self.queue.len() && self.current != Some(index) {
                    self.current = Some(index);
                    self.publish_metadata();
                    self.publish(Duration::ZERO);
                    self.show_notification();
                }
            }
            EngineEvent::ItemTransition(None) => {}
            EngineEvent::Error(msg) => {
                // Not recovered: the state keeps whatever the last good event said.
                warn!(state = ?self.state, "playback engine error: {msg}");
            }
        }
    }

    /// Tear down on shutdown: free the engine, drop the notification, leave the bus.
    pub fn release(&mut self) {
        self.engine.release();
        self.notifier.hide();
        self.set_active(false);
    }

    fn skip_to(&mut self, index: usize) {
        self.engine.seek_to_item(index);
        self.current = Some(index);
        self.publish_metadata();
        self.publish(Duration::ZERO);
        self.show_notification();
    }

    fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.active = active;
            self.media.set_active(active);
        }
    }

    fn publish_metadata(&mut self) {
        let now_playing = self.now_playing();
        self.media.set_metadata(now_playing.as_ref());
    }

    fn publish(&mut self, position: Duration) {
        self.media.set_state(self.state, position);
        self.cell.set(SessionSnapshot {
            state: self.state,
            now_playing: self.now_playing(),
            position,
            active: self.active,
        });
    }

    fn show_notification(&mut self) {
        if let Some(now_playing) = self.now_playing() {
            let content = NotificationContent::from_now_playing(&now_playing, self.state);
            self.notifier.show(&content);
        }
    }
}
