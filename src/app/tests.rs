use super::*;
use crate::library::{ScanOutcome, Track};
use crate::session::{NowPlaying, PlaybackState, SessionSnapshot};
use std::path::PathBuf;
use std::time::Duration;

fn t(id: u64, title: &str) -> Track {
    Track {
        id,
        path: PathBuf::from(format!("/music/{title}.mp3")),
        title: title.into(),
        artist: None,
        album: None,
        duration: Some(Duration::from_secs(200)),
        date_added: id,
    }
}

fn outcome(tracks: Vec<Track>) -> ScanOutcome {
    ScanOutcome {
        tracks,
        blocked: false,
    }
}

fn snapshot(state: PlaybackState, track: Option<Track>, position: Duration) -> SessionSnapshot {
    SessionSnapshot {
        state,
        now_playing: track.map(|track| NowPlaying {
            track,
            queue_index: 0,
            queue_len: 1,
        }),
        position,
        active: true,
    }
}

#[test]
fn loaded_tracks_scan_result_emptiness() {
    let mut view = ViewState::new(true);
    assert!(view.scanning);
    assert_eq!(view.status_line(), "Loading library...");

    view.apply_library(outcome(vec![t(1, "A")]));
    assert!(view.loaded);
    assert!(!view.scanning);

    view.apply_library(outcome(vec![]));
    assert!(!view.loaded);
    assert_eq!(view.status_line(), "No tracks found");
}

#[test]
fn blocked_scan_shows_permission_message() {
    let mut view = ViewState::new(true);
    view.apply_library(ScanOutcome {
        tracks: vec![],
        blocked: true,
    });
    assert!(!view.loaded);
    assert!(view.status_line().contains("denied"));
}

#[test]
fn list_keeps_scan_order() {
    let mut view = ViewState::new(true);
    view.apply_library(outcome(vec![t(1, "A"), t(2, "B")]));
    let titles: Vec<&str> = view.tracks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B"]);
}

#[test]
fn is_playing_only_in_playing_state() {
    let mut view = ViewState::new(true);
    view.apply_library(outcome(vec![t(1, "A")]));

    for (state, playing) in [
        (PlaybackState::Preparing, false),
        (PlaybackState::Playing, true),
        (PlaybackState::Paused, false),
        (PlaybackState::Stopped, false),
    ] {
        view.apply_snapshot(&snapshot(state, Some(t(1, "A")), Duration::ZERO));
        assert_eq!(view.is_playing, playing, "{state:?}");
    }
}

#[test]
fn playback_started_sticks_after_stop() {
    let mut view = ViewState::new(true);
    view.apply_library(outcome(vec![t(1, "A")]));
    assert_eq!(view.status_line(), "1 tracks");

    view.start_playing();
    view.apply_snapshot(&snapshot(PlaybackState::Playing, Some(t(1, "A")), Duration::ZERO));
    assert_eq!(view.status_line(), "Playing");

    view.apply_snapshot(&snapshot(PlaybackState::Stopped, None, Duration::ZERO));
    assert!(view.playback_started);
    assert_eq!(view.status_line(), "Stopped");
    assert!(view.now_playing_line().is_none());
}

#[test]
fn now_playing_line_formats_position_and_duration() {
    let mut view = ViewState::new(true);
    view.apply_snapshot(&snapshot(
        PlaybackState::Playing,
        Some(t(1, "Song")),
        Duration::from_secs(65),
    ));
    assert_eq!(view.now_playing_line().as_deref(), Some("Song [01:05 / 03:20]"));
    assert!((view.progress() - 0.325).abs() < 1e-9);

    view.tick_position(Duration::from_secs(400));
    assert_eq!(view.progress(), 1.0);
}

#[test]
fn format_duration_rolls_over_to_hours() {
    assert_eq!(format_duration(Duration::from_secs(59)), "00:59");
    assert_eq!(format_duration(Duration::from_secs(3_725)), "1:02:05");
}

#[test]
fn selection_moves_within_bounds() {
    let mut view = ViewState::new(false);
    view.apply_library(outcome(vec![t(1, "A"), t(2, "B"), t(3, "C")]));

    view.prev();
    assert_eq!(view.selected, 0);
    view.next();
    view.next();
    view.next();
    assert_eq!(view.selected, 2);
    view.top();
    assert_eq!(view.selected_track().map(|t| t.id), Some(1));
    view.bottom();
    assert_eq!(view.selected_track().map(|t| t.id), Some(3));

    // A shorter rescan clamps the cursor.
    view.apply_library(outcome(vec![t(1, "A")]));
    assert_eq!(view.selected, 0);
}

#[test]
fn selection_follows_playback_when_enabled() {
    let tracks = vec![t(1, "A"), t(2, "B"), t(3, "C")];

    let mut view = ViewState::new(true);
    view.apply_library(outcome(tracks.clone()));
    view.apply_snapshot(&snapshot(PlaybackState::Playing, Some(t(3, "C")), Duration::ZERO));
    assert_eq!(view.selected, 2);

    // Moving away does not snap back until the track changes.
    view.top();
    view.apply_snapshot(&snapshot(PlaybackState::Paused, Some(t(3, "C")), Duration::ZERO));
    assert_eq!(view.selected, 0);

    let mut fixed = ViewState::new(false);
    fixed.apply_library(outcome(tracks));
    fixed.apply_snapshot(&snapshot(PlaybackState::Playing, Some(t(3, "C")), Duration::ZERO));
    assert_eq!(fixed.selected, 0);
}

#[test]
fn now_playing_is_found_by_path_after_a_rescan_renumbers_ids() {
    let mut view = ViewState::new(true);
    view.apply_library(outcome(vec![t(1, "A"), t(2, "B"), t(3, "C")]));
    // The session keeps the track from the first scan.
    let playing = t(3, "C");
    view.apply_snapshot(&snapshot(PlaybackState::Playing, Some(playing.clone()), Duration::ZERO));

    // A new file lands first and every id shifts by one.
    view.apply_library(outcome(vec![t(1, "New"), t(2, "A"), t(3, "B"), t(4, "C")]));
    assert_eq!(view.index_of_now_playing(), Some(3));
    assert_eq!(view.tracks[3].path, playing.path);

    view.top();
    view.apply_snapshot(&snapshot(PlaybackState::Playing, Some(t(2, "B")), Duration::ZERO));
    assert_eq!(view.selected, 2);
}

#[test]
fn mini_player_toggles() {
    let mut view = ViewState::new(true);
    view.toggle_mini_player();
    assert!(view.mini_player_expanded);
    view.toggle_mini_player();
    assert!(!view.mini_player_expanded);
}
