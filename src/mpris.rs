use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::config::MprisSettings;
use crate::session::{MediaSession, NowPlaying, PlaybackState};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Transport requests from desktop surfaces (MPRIS, notification buttons).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    /// Absolute position in the current track.
    SetPosition(Duration),
    OpenUri(String),
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    active: bool,
    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    has_next: bool,
    has_previous: bool,
    /// Position at `position_at`; extrapolated while playing.
    position: Duration,
    position_at: Option<Instant>,
}

impl SharedState {
    fn position(&self) -> Duration {
        match (self.playback, self.position_at) {
            (PlaybackState::Playing, Some(at)) => self.position + at.elapsed(),
            _ => self.position,
        }
    }

    fn has_track(&self) -> bool {
        self.track_id.is_some()
    }
}

/// Which properties changed since the last emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Changed {
    Status,
    Metadata,
    /// Position jumped; emit `Seeked`.
    Seeked(i64),
}

/// Session-side handle; writes go to the shared state and wake the bus thread.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Changed>,
}

impl MprisHandle {
    pub fn set_track_metadata(&self, now_playing: Option<&NowPlaying>) {
        if let Ok(mut s) = self.state.lock() {
            match now_playing {
                Some(np) => {
                    let track = &np.track;
                    s.track_id = track_object_path(track.id);
                    s.title = Some(track.title.clone());
                    s.artist = track.artist.clone().into_iter().collect();
                    s.album = track.album.clone();
                    s.url = Some(track.uri());
                    s.length_micros = track.duration.map(|d| d.as_micros() as i64);
                    s.has_next = np.has_next();
                    s.has_previous = np.has_previous();
                }
                None => {
                    s.track_id = None;
                    s.title = None;
                    s.artist.clear();
                    s.album = None;
                    s.url = None;
                    s.length_micros = None;
                    s.has_next = false;
                    s.has_previous = false;
                }
            }
        }
        let _ = self.notify.send(Changed::Metadata);
    }

    pub fn set_playback(&self, playback: PlaybackState, position: Duration) {
        let mut jumped = None;
        if let Ok(mut s) = self.state.lock() {
            let expected = s.position();
            let delta = expected.abs_diff(position);
            if s.playback == playback && delta > Duration::from_secs(1) {
                jumped = Some(position.as_micros() as i64);
            }
            s.playback = playback;
            s.position = position;
            s.position_at = Some(Instant::now());
        }
        let _ = self.notify.send(Changed::Status);
        if let Some(micros) = jumped {
            let _ = self.notify.send(Changed::Seeked(micros));
        }
    }
}

impl MediaSession for MprisHandle {
    fn set_state(&mut self, state: PlaybackState, position: Duration) {
        self.set_playback(state, position);
    }

    fn set_metadata(&mut self, now_playing: Option<&NowPlaying>) {
        self.set_track_metadata(now_playing);
    }

    fn set_active(&mut self, active: bool) {
        if let Ok(mut s) = self.state.lock() {
            s.active = active;
        }
        let _ = self.notify.send(Changed::Status);
    }
}

fn track_object_path(id: u64) -> Option<OwnedObjectPath> {
    OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{id}")).ok()
}

/// Well-known bus name for `identity`; characters D-Bus rejects become `_`.
fn bus_name(identity: &str) -> String {
    let element: String = identity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let element = if element.starts_with(|c: char| c.is_ascii_digit()) || element.is_empty() {
        format!("_{element}")
    } else {
        element
    };
    format!("org.mpris.MediaPlayer2.{element}")
}

fn send(tx: &Sender<ControlCmd>, cmd: ControlCmd) {
    if tx.send(cmd).is_err() {
        debug!("MPRIS: control channel closed");
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
    identity: String,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        send(&self.tx, ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.identity.clone()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        ["audio/mpeg", "audio/flac", "audio/wav", "audio/ogg"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn read<T>(&self, f: impl FnOnce(&SharedState) -> T, fallback: T) -> T {
        self.state.lock().map(|s| f(&*s)).unwrap_or(fallback)
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        send(&self.tx, ControlCmd::Next);
    }

    fn previous(&self) {
        send(&self.tx, ControlCmd::Prev);
    }

    fn play(&self) {
        send(&self.tx, ControlCmd::Play);
    }

    fn pause(&self) {
        send(&self.tx, ControlCmd::Pause);
    }

    fn play_pause(&self) {
        send(&self.tx, ControlCmd::PlayPause);
    }

    fn stop(&self) {
        send(&self.tx, ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        send(&self.tx, ControlCmd::Seek(offset));
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.read(
            |s| s.track_id.as_ref().map(|p| p.as_str() == track_id.as_str()),
            None,
        );
        // Stale track ids and negative positions are ignored.
        if current == Some(true) && position >= 0 {
            send(
                &self.tx,
                ControlCmd::SetPosition(Duration::from_micros(position as u64)),
            );
        }
    }

    fn open_uri(&self, uri: String) {
        send(&self.tx, ControlCmd::OpenUri(uri));
    }

    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let playback = self.read(|s| s.playback, PlaybackState::Stopped);
        match playback {
            PlaybackState::Preparing | PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::Idle | PlaybackState::Stopped => "Stopped",
        }
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.read(|s| s.position().as_micros() as i64, 0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.read(|s| s.active && s.has_track(), false)
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.read(|s| s.active && s.has_track(), false)
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.read(|s| s.active && s.length_micros.is_some(), false)
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.read(|s| s.has_next, false)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.read(|s| s.has_previous, false)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        // `playerctl` expects a track id even when nothing is loaded.
        let track_id = s
            .track_id
            .clone()
            .or_else(|| OwnedObjectPath::try_from(format!("{OBJECT_PATH}/NoTrack")).ok());
        if let Some(id) = track_id {
            insert(&mut map, "mpris:trackid", Value::from(id.into_inner()));
        }
        if let Some(title) = &s.title {
            insert(&mut map, "xesam:title", Value::from(title.clone()));
        }
        if !s.artist.is_empty() {
            insert(&mut map, "xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            insert(&mut map, "xesam:album", Value::from(album.clone()));
        }
        if let Some(url) = &s.url {
            insert(&mut map, "xesam:url", Value::from(url.clone()));
        }
        if let Some(len) = s.length_micros {
            insert(&mut map, "mpris:length", Value::from(len));
        }
        map
    }
}

fn insert(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    match OwnedValue::try_from(value) {
        Ok(v) => {
            map.insert(key.to_string(), v);
        }
        Err(e) => debug!("MPRIS: dropping metadata {key}: {e}"),
    }
}

/// Publish the player on the session bus from a background thread.
///
/// Connection failures are logged and leave the returned handle inert.
pub fn spawn_mpris(tx: Sender<ControlCmd>, settings: &MprisSettings) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<Changed>();

    let state_for_thread = state.clone();
    let identity = settings.identity.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, identity, state_for_thread, notify_rx).await {
                warn!("MPRIS: service stopped: {e}");
            }
        });
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

async fn serve(
    tx: Sender<ControlCmd>,
    identity: String,
    state: Arc<Mutex<SharedState>>,
    notify_rx: Receiver<Changed>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    let name = bus_name(&identity);
    connection.request_name(name.as_str()).await?;

    let object_server = connection.object_server();
    object_server
        .at(
            OBJECT_PATH,
            RootIface {
                tx: tx.clone(),
                identity,
            },
        )
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    info!(%name, "MPRIS: registered");

    let iface_ref = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    loop {
        let mut status = false;
        let mut metadata = false;
        let mut seeked = None;
        loop {
            match notify_rx.try_recv() {
                Ok(Changed::Status) => status = true,
                Ok(Changed::Metadata) => metadata = true,
                Ok(Changed::Seeked(micros)) => seeked = Some(micros),
                Err(TryRecvError::Empty) => break,
                // The session is gone; stop serving.
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        let emitter = iface_ref.signal_emitter();
        let iface = iface_ref.get().await;
        if status {
            iface.playback_status_changed(emitter).await?;
            iface.can_play_changed(emitter).await?;
            iface.can_pause_changed(emitter).await?;
            iface.can_seek_changed(emitter).await?;
        }
        if metadata {
            iface.metadata_changed(emitter).await?;
            iface.can_go_next_changed(emitter).await?;
            iface.can_go_previous_changed(emitter).await?;
        }
        if let Some(micros) = seeked {
            PlayerIface::seeked(emitter, micros).await?;
        }
        drop(iface);

        Timer::after(Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests;
