use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use super::error::EngineError;
use super::queue::ItemQueue;
use super::sink::create_sink_at;
use super::types::{EngineCmd, EngineEvent, PlaybackHandle, PlaybackInfo};

/// How often the thread wakes up without commands to check for end of item.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub(super) fn spawn_audio_thread(
    rx: Receiver<EngineCmd>,
    events: Sender<EngineEvent>,
    playback: PlaybackHandle,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let err = EngineError::from(e);
                warn!("audio engine unavailable: {err}");
                let _ = events.send(EngineEvent::Error(err.to_string()));
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let mut audio = AudioThread {
            stream,
            queue: ItemQueue::default(),
            sink: None,
            play_when_ready: false,
            events,
            playback,
        };

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(EngineCmd::Release { fade_out_ms }) => {
                    audio.release(fade_out_ms);
                    break;
                }
                Ok(cmd) => audio.handle(cmd),
                Err(RecvTimeoutError::Timeout) => audio.check_item_finished(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

struct AudioThread {
    stream: OutputStream,
    queue: ItemQueue,
    sink: Option<Sink>,
    play_when_ready: bool,
    events: Sender<EngineEvent>,
    playback: PlaybackHandle,
}

impl AudioThread {
    fn handle(&mut self, cmd: EngineCmd) {
        match cmd {
            EngineCmd::Stop => self.stop(),
            EngineCmd::ClearItems => {
                self.stop();
                self.queue.clear();
                self.update_info(|info| info.index = None);
                self.emit(EngineEvent::ItemTransition(None));
            }
            EngineCmd::AddItems(items) => {
                let was_empty = self.queue.current().is_none();
                self.queue.extend(items);
                debug!(len = self.queue.len(), "engine queue extended");
                if was_empty && let Some(i) = self.queue.index() {
                    self.update_info(|info| info.index = Some(i));
                    self.emit(EngineEvent::ItemTransition(Some(i)));
                }
            }
            EngineCmd::Prepare => {
                if self.sink.is_none() {
                    self.prepare_current(Duration::ZERO);
                }
            }
            EngineCmd::Play => {
                self.play_when_ready = true;
                match self.sink.as_ref() {
                    Some(s) if s.is_paused() => {
                        s.play();
                        self.mark_resumed();
                    }
                    Some(_) => {}
                    None => self.prepare_current(Duration::ZERO),
                }
            }
            EngineCmd::Pause => {
                self.play_when_ready = false;
                if let Some(s) = self.sink.as_ref()
                    && !s.is_paused()
                {
                    s.pause();
                    self.mark_paused();
                }
            }
            EngineCmd::SeekTo(position) => {
                if self.sink.is_some() {
                    self.prepare_current(position);
                }
            }
            EngineCmd::SeekToItem(index) => {
                if self.queue.seek_to(index) {
                    self.prepare_current(Duration::ZERO);
                    self.emit(EngineEvent::ItemTransition(Some(index)));
                }
            }
            EngineCmd::Release { fade_out_ms } => self.release(fade_out_ms),
        }
    }

    /// Decode the current item into a fresh sink starting at `start_at`,
    /// replacing any previous sink. Plays right away when `play_when_ready`.
    fn prepare_current(&mut self, start_at: Duration) {
        let Some(path) = self.queue.current().map(|item| item.path.clone()) else {
            return;
        };
        let index = self.queue.index();
        let was_playing = self.is_playing();

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        match create_sink_at(&self.stream, &path, start_at) {
            Ok(sink) => {
                let playing = self.play_when_ready;
                if playing {
                    sink.play();
                }
                self.sink = Some(sink);
                self.update_info(|info| {
                    info.index = index;
                    info.elapsed = start_at;
                    info.resumed_at = playing.then(Instant::now);
                });
                self.emit(EngineEvent::Ready);
                if playing != was_playing {
                    self.emit(EngineEvent::IsPlayingChanged(playing));
                }
            }
            Err(e) => {
                warn!("engine failed to prepare item: {e}");
                self.update_info(|info| {
                    info.elapsed = Duration::ZERO;
                    info.resumed_at = None;
                });
                self.emit(EngineEvent::Error(e.to_string()));
                if was_playing {
                    self.emit(EngineEvent::IsPlayingChanged(false));
                }
            }
        }
    }

    fn stop(&mut self) {
        let was_playing = self.is_playing();
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.play_when_ready = false;
        self.update_info(|info| {
            info.elapsed = Duration::ZERO;
            info.resumed_at = None;
        });
        if was_playing {
            self.emit(EngineEvent::IsPlayingChanged(false));
        }
    }

    /// Auto-advance once the current item has drained; stop at the end of the queue.
    fn check_item_finished(&mut self) {
        let finished = self.play_when_ready && self.sink.as_ref().is_some_and(|s| s.empty());
        if !finished {
            return;
        }

        match self.queue.advance() {
            Some(next) => {
                self.prepare_current(Duration::ZERO);
                self.emit(EngineEvent::ItemTransition(Some(next)));
            }
            None => {
                debug!("engine reached end of queue");
                self.sink = None;
                self.play_when_ready = false;
                self.mark_paused();
            }
        }
    }

    fn release(&mut self, fade_out_ms: u64) {
        if let Some(s) = self.sink.take() {
            fade_out_sink(&s, fade_out_ms);
            s.stop();
        }
        // Update shared state so UI/MPRIS don't keep showing Playing.
        self.update_info(|info| info.resumed_at = None);
    }

    fn mark_resumed(&self) {
        self.update_info(|info| {
            if info.resumed_at.is_none() {
                info.resumed_at = Some(Instant::now());
            }
        });
        self.emit(EngineEvent::IsPlayingChanged(true));
    }

    fn mark_paused(&self) {
        self.update_info(|info| {
            if let Some(t) = info.resumed_at.take() {
                info.elapsed += t.elapsed();
            }
        });
        self.emit(EngineEvent::IsPlayingChanged(false));
    }

    fn is_playing(&self) -> bool {
        self.playback
            .lock()
            .map(|info| info.playing())
            .unwrap_or(false)
    }

    fn update_info(&self, f: impl FnOnce(&mut PlaybackInfo)) {
        if let Ok(mut info) = self.playback.lock() {
            f(&mut info);
        }
    }

    fn emit(&self, event: EngineEvent) {
        // The runtime may already be gone during shutdown.
        let _ = self.events.send(event);
    }
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    sink.set_volume(1.0);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(1.0 - t);
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
