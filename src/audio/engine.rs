use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::config::AudioSettings;

use super::thread::spawn_audio_thread;
use super::types::{EngineCmd, EngineEvent, MediaItem, PlaybackHandle, PlaybackInfo};

/// Commands the playback session issues to a playback engine.
///
/// Implementations answer asynchronously with [`EngineEvent`]s; none of these
/// calls report failure directly.
pub trait Engine {
    fn stop(&mut self);
    fn clear_items(&mut self);
    fn add_items(&mut self, items: Vec<MediaItem>);
    fn prepare(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_to(&mut self, position: Duration);
    fn seek_to_item(&mut self, index: usize);
    /// Position in the current item.
    fn position(&self) -> Duration;
    /// Free the engine's resources. Further commands are ignored.
    fn release(&mut self);
}

/// `rodio`-backed engine running on its own audio thread.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    playback: PlaybackHandle,
    join: Option<JoinHandle<()>>,
    quit_fade_out: Duration,
}

impl RodioEngine {
    pub fn new(events: Sender<EngineEvent>, audio_settings: &AudioSettings) -> Self {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let audio_handle = spawn_audio_thread(rx, events, playback.clone());

        Self {
            tx,
            playback,
            join: Some(audio_handle),
            quit_fade_out: Duration::from_millis(audio_settings.quit_fade_out_ms),
        }
    }

    fn send(&self, cmd: EngineCmd) {
        if let Err(e) = self.tx.send(cmd) {
            debug!("audio thread gone, dropping {:?}", e.0);
        }
    }
}

impl Engine for RodioEngine {
    fn stop(&mut self) {
        self.send(EngineCmd::Stop);
    }

    fn clear_items(&mut self) {
        self.send(EngineCmd::ClearItems);
    }

    fn add_items(&mut self, items: Vec<MediaItem>) {
        self.send(EngineCmd::AddItems(items));
    }

    fn prepare(&mut self) {
        self.send(EngineCmd::Prepare);
    }

    fn play(&mut self) {
        self.send(EngineCmd::Play);
    }

    fn pause(&mut self) {
        self.send(EngineCmd::Pause);
    }

    fn seek_to(&mut self, position: Duration) {
        self.send(EngineCmd::SeekTo(position));
    }

    fn seek_to_item(&mut self, index: usize) {
        self.send(EngineCmd::SeekToItem(index));
    }

    fn position(&self) -> Duration {
        self.playback
            .lock()
            .map(|info| info.position())
            .unwrap_or(Duration::ZERO)
    }

    fn release(&mut self) {
        self.send(EngineCmd::Release {
            fade_out_ms: self.quit_fade_out.as_millis() as u64,
        });

        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}
