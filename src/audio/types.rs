//! Audio-related small types and handles.
//!
//! This module defines the engine command/event enums, the queued media item
//! and the playback info shared with the runtime for position queries.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::library::Track;

/// One entry of the engine's play queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub uri: String,
    pub path: PathBuf,
}

impl MediaItem {
    pub fn from_track(track: &Track) -> Self {
        Self {
            uri: track.uri(),
            path: track.path.clone(),
        }
    }
}

#[derive(Debug)]
pub enum EngineCmd {
    /// Stop playback and drop the decoded source; the queue is kept.
    Stop,
    /// Remove every queued item.
    ClearItems,
    /// Append items to the queue.
    AddItems(Vec<MediaItem>),
    /// Decode the current item so it is ready to play.
    Prepare,
    Play,
    Pause,
    /// Seek within the current item.
    SeekTo(Duration),
    /// Jump to the queue item at this index.
    SeekToItem(usize),
    /// Shut the audio thread down, fading out over `fade_out_ms` milliseconds.
    Release { fade_out_ms: u64 },
}

/// Asynchronous notifications from the audio thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The current item is decoded and can play.
    Ready,
    IsPlayingChanged(bool),
    /// The current queue index changed (`None` once the queue is cleared).
    ItemTransition(Option<usize>),
    /// Opening the output device or decoding an item failed.
    Error(String),
}

/// Runtime playback information shared with the engine handle.
#[derive(Debug, Clone, Default)]
pub struct PlaybackInfo {
    /// Current queue index (if any).
    pub index: Option<usize>,
    /// Position accumulated up to the last pause or seek.
    pub elapsed: Duration,
    /// When playback last resumed; `None` while paused or stopped.
    pub resumed_at: Option<Instant>,
}

impl PlaybackInfo {
    /// Whether the engine is currently producing audio.
    pub fn playing(&self) -> bool {
        self.resumed_at.is_some()
    }

    /// Position in the current item.
    pub fn position(&self) -> Duration {
        self.elapsed + self.resumed_at.map_or(Duration::ZERO, |t| t.elapsed())
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;
