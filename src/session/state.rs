use std::time::Duration;

use crate::library::Track;

/// Where the session is in its lifecycle.
///
/// `Idle → Preparing → Playing ⇄ Paused → Stopped`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// A track was loaded and the engine has not reported ready yet.
    Preparing,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Preparing => "Loading",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

/// The selected track and where it sits in the loaded queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NowPlaying {
    pub track: Track,
    pub queue_index: usize,
    pub queue_len: usize,
}

impl NowPlaying {
    pub fn has_next(&self) -> bool {
        self.queue_index + 1 < self.queue_len
    }

    pub fn has_previous(&self) -> bool {
        self.queue_index > 0
    }
}

/// What the session publishes to observers after each transition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub now_playing: Option<NowPlaying>,
    pub position: Duration,
    /// Whether the desktop media session is active.
    pub active: bool,
}
