//! View state consumed by the TUI.
//!
//! `ViewState` mirrors the library scan and the session snapshots into plain
//! fields the renderer reads each frame; it never talks to the engine.

use std::path::PathBuf;
use std::time::Duration;

use crate::library::{ScanOutcome, Track};
use crate::session::{PlaybackState, SessionSnapshot};

#[derive(Debug, Default)]
pub struct ViewState {
    pub tracks: Vec<Track>,
    /// A scan is in flight and nothing has been published yet.
    pub scanning: bool,
    /// The last scan produced at least one track.
    pub loaded: bool,
    /// The music folder could not be read.
    pub blocked: bool,
    /// The user started a track at least once.
    pub playback_started: bool,
    pub is_playing: bool,
    pub state: PlaybackState,
    pub now_playing_title: Option<String>,
    pub now_playing_duration: Option<Duration>,
    /// Path of the track the session is on. Ids are reassigned by each scan,
    /// paths are not.
    pub now_playing_path: Option<PathBuf>,
    pub position: Duration,
    pub selected: usize,
    pub mini_player_expanded: bool,
    /// Move the selection along with playback.
    pub follow_playback: bool,
}

impl ViewState {
    pub fn new(follow_playback: bool) -> Self {
        Self {
            scanning: true,
            follow_playback,
            ..Self::default()
        }
    }

    /// Replace the track list with a scan result.
    pub fn apply_library(&mut self, outcome: ScanOutcome) {
        self.tracks = outcome.tracks;
        self.blocked = outcome.blocked;
        self.loaded = !self.tracks.is_empty();
        self.scanning = false;
        self.selected = self.selected.min(self.tracks.len().saturating_sub(1));
    }

    /// A rescan was requested; keep the current list until it lands.
    pub fn begin_rescan(&mut self) {
        self.scanning = true;
    }

    pub fn apply_snapshot(&mut self, snapshot: &SessionSnapshot) {
        self.state = snapshot.state;
        self.is_playing = snapshot.state == PlaybackState::Playing;
        self.position = snapshot.position;

        let track = snapshot.now_playing.as_ref().map(|np| &np.track);
        let path = track.map(|t| t.path.clone());
        let changed = path != self.now_playing_path;
        self.now_playing_path = path;
        self.now_playing_title = track.map(|t| t.title.clone());
        self.now_playing_duration = track.and_then(|t| t.duration);

        if changed && self.follow_playback {
            if let Some(idx) = self.index_of_now_playing() {
                self.selected = idx;
            }
        }
    }

    /// Record that the user started a track. Stays set for the session.
    pub fn start_playing(&mut self) {
        self.playback_started = true;
    }

    pub fn tick_position(&mut self, position: Duration) {
        if self.now_playing_path.is_some() {
            self.position = position;
        }
    }

    pub fn toggle_mini_player(&mut self) {
        self.mini_player_expanded = !self.mini_player_expanded;
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    pub fn index_of_now_playing(&self) -> Option<usize> {
        let path = self.now_playing_path.as_ref()?;
        self.tracks.iter().position(|t| &t.path == path)
    }

    pub fn next(&mut self) {
        if self.selected + 1 < self.tracks.len() {
            self.selected += 1;
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn top(&mut self) {
        self.selected = 0;
    }

    pub fn bottom(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
    }

    /// `title [mm:ss / mm:ss]`, or `None` when nothing is loaded.
    pub fn now_playing_line(&self) -> Option<String> {
        let title = self.now_playing_title.as_deref()?;
        let total = self
            .now_playing_duration
            .map(format_duration)
            .unwrap_or_else(|| "--:--".to_string());
        Some(format!(
            "{title} [{} / {total}]",
            format_duration(self.position)
        ))
    }

    /// Fraction of the current track played, for the progress gauge.
    pub fn progress(&self) -> f64 {
        match self.now_playing_duration {
            Some(total) if !total.is_zero() => {
                (self.position.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn status_line(&self) -> String {
        if self.blocked {
            return "Permission to read the music folder was denied".to_string();
        }
        if self.scanning && !self.loaded {
            return "Loading library...".to_string();
        }
        if !self.loaded {
            return "No tracks found".to_string();
        }
        if !self.playback_started {
            return format!("{} tracks", self.tracks.len());
        }
        self.state.label().to_string()
    }
}

/// `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
