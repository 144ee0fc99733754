use super::*;
use crate::library::Track;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

fn make_now_playing(index: usize, len: usize) -> NowPlaying {
    NowPlaying {
        track: Track {
            id: 7,
            path: PathBuf::from("/tmp/music/test.mp3"),
            title: "Test Title".to_string(),
            artist: Some("Test Artist".to_string()),
            album: Some("Test Album".to_string()),
            duration: Some(Duration::from_micros(1_234_567)),
            date_added: 0,
        },
        queue_index: index,
        queue_len: len,
    }
}

fn handle() -> (MprisHandle, Arc<Mutex<SharedState>>, Receiver<Changed>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<Changed>();
    let handle = MprisHandle {
        state: state.clone(),
        notify: notify_tx,
    };
    (handle, state, notify_rx)
}

fn player(state: &Arc<Mutex<SharedState>>) -> (PlayerIface, Receiver<ControlCmd>) {
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    (
        PlayerIface {
            tx,
            state: state.clone(),
        },
        rx,
    )
}

#[test]
fn set_track_metadata_sets_and_clears_shared_state() {
    let (handle, state, notify_rx) = handle();

    handle.set_track_metadata(Some(&make_now_playing(0, 2)));
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Artist".to_string()]);
        assert_eq!(s.album.as_deref(), Some("Test Album"));
        assert!(s.url.as_deref().unwrap().contains("/tmp/music/test.mp3"));
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str()),
            Some("/org/mpris/MediaPlayer2/track/7")
        );
        assert!(s.has_next);
        assert!(!s.has_previous);
    }

    handle.set_track_metadata(None);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
        assert!(!s.has_next);
    }

    let changes: Vec<Changed> = notify_rx.try_iter().collect();
    assert_eq!(changes, vec![Changed::Metadata, Changed::Metadata]);
}

#[test]
fn playback_status_maps_session_states() {
    let (handle, state, _notify_rx) = handle();
    let (iface, _rx) = player(&state);

    let cases = [
        (PlaybackState::Idle, "Stopped"),
        (PlaybackState::Preparing, "Playing"),
        (PlaybackState::Playing, "Playing"),
        (PlaybackState::Paused, "Paused"),
        (PlaybackState::Stopped, "Stopped"),
    ];
    for (playback, expected) in cases {
        handle.set_playback(playback, Duration::ZERO);
        assert_eq!(iface.playback_status(), expected, "{playback:?}");
    }
}

#[test]
fn position_jump_while_paused_emits_seeked() {
    let (handle, _state, notify_rx) = handle();

    handle.set_playback(PlaybackState::Paused, Duration::from_secs(3));
    handle.set_playback(PlaybackState::Paused, Duration::from_secs(40));

    let changes: Vec<Changed> = notify_rx.try_iter().collect();
    assert_eq!(
        changes,
        vec![
            Changed::Status,
            Changed::Status,
            Changed::Seeked(40_000_000),
        ]
    );
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let (handle, state, _notify_rx) = handle();
    let (iface, _rx) = player(&state);

    handle.set_track_metadata(Some(&make_now_playing(1, 2)));

    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
    assert!(iface.can_go_previous());
    assert!(!iface.can_go_next());
}

#[test]
fn metadata_without_track_only_carries_placeholder_id() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, _rx) = player(&state);

    let map = iface.metadata();
    assert_eq!(map.len(), 1);
    assert!(map.contains_key("mpris:trackid"));
}

#[test]
fn can_play_requires_an_active_session_with_a_track() {
    let (mut handle, state, _notify_rx) = handle();
    let (iface, _rx) = player(&state);
    assert!(!iface.can_play());

    handle.set_track_metadata(Some(&make_now_playing(0, 1)));
    assert!(!iface.can_play());

    handle.set_active(true);
    assert!(iface.can_play());
    assert!(iface.can_pause());
    assert!(iface.can_seek());
}

#[test]
fn player_methods_forward_control_commands() {
    let (handle, state, _notify_rx) = handle();
    let (iface, rx) = player(&state);
    handle.set_track_metadata(Some(&make_now_playing(0, 1)));

    iface.play_pause();
    iface.next();
    iface.seek(-5_000_000);
    iface.open_uri("file:///tmp/music/other.mp3".to_string());

    let current = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/7").unwrap();
    iface.set_position(current.clone(), 2_000_000);
    // Negative position and stale ids are ignored.
    iface.set_position(current, -1);
    let stale = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/1").unwrap();
    iface.set_position(stale, 1_000_000);

    let cmds: Vec<ControlCmd> = rx.try_iter().collect();
    assert_eq!(
        cmds,
        vec![
            ControlCmd::PlayPause,
            ControlCmd::Next,
            ControlCmd::Seek(-5_000_000),
            ControlCmd::OpenUri("file:///tmp/music/other.mp3".to_string()),
            ControlCmd::SetPosition(Duration::from_secs(2)),
        ]
    );
}

#[test]
fn bus_name_sanitizes_identity() {
    assert_eq!(bus_name("simplay"), "org.mpris.MediaPlayer2.simplay");
    assert_eq!(bus_name("my-player 2"), "org.mpris.MediaPlayer2.my_player_2");
    assert_eq!(bus_name("9lives"), "org.mpris.MediaPlayer2._9lives");
}
