//! Outbound surfaces the session keeps in sync: the desktop media session
//! and the playback notification.

use std::time::Duration;

use super::state::{NowPlaying, PlaybackState};

/// OS-level media session (MPRIS on Linux desktops).
pub trait MediaSession {
    fn set_state(&mut self, state: PlaybackState, position: Duration);
    fn set_metadata(&mut self, now_playing: Option<&NowPlaying>);
    fn set_active(&mut self, active: bool);
}

/// Playback notification with transport actions.
pub trait Notifier {
    /// Show the notification, replacing the visible one if any.
    fn show(&mut self, content: &NotificationContent);
    fn hide(&mut self);
}

/// A disabled surface is simply absent.
impl<T: MediaSession> MediaSession for Option<T> {
    fn set_state(&mut self, state: PlaybackState, position: Duration) {
        if let Some(inner) = self {
            inner.set_state(state, position);
        }
    }

    fn set_metadata(&mut self, now_playing: Option<&NowPlaying>) {
        if let Some(inner) = self {
            inner.set_metadata(now_playing);
        }
    }

    fn set_active(&mut self, active: bool) {
        if let Some(inner) = self {
            inner.set_active(active);
        }
    }
}

impl<T: Notifier> Notifier for Option<T> {
    fn show(&mut self, content: &NotificationContent) {
        if let Some(inner) = self {
            inner.show(content);
        }
    }

    fn hide(&mut self) {
        if let Some(inner) = self {
            inner.hide();
        }
    }
}

/// Transport actions offered on the notification. There is no "previous".
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NotificationAction {
    PlayPause,
    Next,
    Stop,
}

impl NotificationAction {
    /// Stable identifier sent back by the notification daemon.
    pub fn key(self) -> &'static str {
        match self {
            Self::PlayPause => "play-pause",
            Self::Next => "next",
            Self::Stop => "stop",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "play-pause" => Some(Self::PlayPause),
            "next" => Some(Self::Next),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// What the notification shows for the current track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub artist: Option<String>,
    pub playing: bool,
}

impl NotificationContent {
    pub fn from_now_playing(now_playing: &NowPlaying, state: PlaybackState) -> Self {
        Self {
            title: now_playing.track.title.clone(),
            artist: now_playing.track.artist.clone(),
            playing: matches!(state, PlaybackState::Playing | PlaybackState::Preparing),
        }
    }

    /// Body line: `Artist - Title`, or the bare title.
    pub fn body(&self) -> String {
        match self.artist.as_deref() {
            Some(a) => format!("{a} - {}", self.title),
            None => self.title.clone(),
        }
    }

    /// Actions with their button labels, in display order.
    pub fn actions(&self) -> Vec<(NotificationAction, &'static str)> {
        let play_pause = if self.playing { "Pause" } else { "Play" };
        vec![
            (NotificationAction::PlayPause, play_pause),
            (NotificationAction::Next, "Next"),
            (NotificationAction::Stop, "Stop"),
        ]
    }
}
