use super::*;
use crate::config::LibrarySettings;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tempfile::tempdir;

struct FixedSource(Vec<TrackRow>);

impl TrackSource for FixedSource {
    fn query(&self) -> Result<Vec<TrackRow>, LibraryError> {
        Ok(self.0.clone())
    }
}

struct FailingSource(fn() -> LibraryError);

impl TrackSource for FailingSource {
    fn query(&self) -> Result<Vec<TrackRow>, LibraryError> {
        Err((self.0)())
    }
}

fn row(path: &str, title: &str, date_added: u64) -> TrackRow {
    TrackRow {
        path: PathBuf::from(path),
        title: title.to_string(),
        artist: None,
        album: None,
        duration: Some(Duration::from_secs(180)),
        date_added,
    }
}

fn titles(outcome: &ScanOutcome) -> Vec<&str> {
    outcome.tracks.iter().map(|t| t.title.as_str()).collect()
}

#[test]
fn scan_orders_by_date_added_ascending_and_assigns_ids() {
    let source = FixedSource(vec![
        row("/music/b.mp3", "B", 200),
        row("/music/a.mp3", "A", 100),
    ]);

    let outcome = scan(&source);
    assert!(!outcome.blocked);
    assert_eq!(titles(&outcome), vec!["A", "B"]);
    assert_eq!(outcome.tracks[0].id, 1);
    assert_eq!(outcome.tracks[1].id, 2);
}

#[test]
fn scan_breaks_date_ties_by_path() {
    let source = FixedSource(vec![
        row("/music/z.mp3", "Z", 5),
        row("/music/m.mp3", "M", 5),
        row("/music/a.mp3", "A", 9),
    ]);

    assert_eq!(titles(&scan(&source)), vec!["M", "Z", "A"]);
}

#[test]
fn scan_failure_yields_empty_list() {
    let outcome = scan(&FailingSource(|| {
        LibraryError::NotFound(PathBuf::from("/nope"))
    }));
    assert!(outcome.tracks.is_empty());
    assert!(!outcome.blocked);
}

#[test]
fn scan_permission_denied_is_reported_as_blocked() {
    let outcome = scan(&FailingSource(|| {
        LibraryError::PermissionDenied(PathBuf::from("/root/Music"))
    }));
    assert!(outcome.tracks.is_empty());
    assert!(outcome.blocked);
}

#[test]
fn spawn_scan_publishes_one_whole_list() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_scan(FixedSource(vec![row("/m/a.mp3", "A", 1)]), tx);
    handle.join().unwrap();

    let LibraryEvent::Scanned(outcome) = rx.recv().unwrap();
    assert_eq!(titles(&outcome), vec!["A"]);
    assert!(rx.try_recv().is_err());
}

#[test]
fn uri_resolves_back_to_the_track_path() {
    let t = row("/tmp/music/My Song.mp3", "My Song", 0).into_track(1);
    let uri = t.uri();
    assert!(uri.starts_with("file:///tmp/music/"));
    assert_eq!(uri_to_path(&uri).as_deref(), Some(Path::new("/tmp/music/My Song.mp3")));
}

#[test]
fn uri_to_path_rejects_other_schemes_and_garbage() {
    assert_eq!(uri_to_path("https://example.com/a.mp3"), None);
    assert_eq!(uri_to_path("not a uri"), None);
    assert_eq!(uri_to_path(""), None);
}

#[test]
fn relative_track_path_renders_an_absolute_uri() {
    let t = row("Music/rel song.mp3", "rel song", 0).into_track(1);
    let uri = t.uri();
    let expected = std::env::current_dir().unwrap().join("Music/rel song.mp3");

    assert!(uri.starts_with("file:///"), "{uri}");
    assert!(uri.ends_with("/Music/rel%20song.mp3"), "{uri}");
    assert_eq!(uri_to_path(&uri), Some(expected));
}

#[test]
fn directory_source_filters_extensions_and_falls_back_to_file_stem() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
    fs::write(dir.path().join("A.ogg"), b"not a real ogg").unwrap();
    fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

    let source = DirectorySource::new(dir.path(), LibrarySettings::default());
    let mut rows = source.query().unwrap();
    rows.sort_by(|a, b| a.title.cmp(&b.title));

    let names: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(names, vec!["A", "b"]);
    assert!(rows.iter().all(|r| r.artist.is_none() && r.duration.is_none()));
}

#[test]
fn directory_source_respects_hidden_and_recursion_settings() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden.mp3"), b"x").unwrap();
    fs::write(dir.path().join("root.mp3"), b"x").unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("child.mp3"), b"x").unwrap();

    let settings = LibrarySettings {
        include_hidden: false,
        recursive: false,
        ..LibrarySettings::default()
    };
    let rows = DirectorySource::new(dir.path(), settings).query().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(names, vec!["root"]);
}

#[test]
fn directory_source_respects_max_depth() {
    let dir = tempdir().unwrap();
    let d1 = dir.path().join("d1");
    let d2 = d1.join("d2");
    fs::create_dir_all(&d2).unwrap();
    fs::write(dir.path().join("root.mp3"), b"x").unwrap();
    fs::write(d1.join("one.mp3"), b"x").unwrap();
    fs::write(d2.join("two.mp3"), b"x").unwrap();

    // WalkDir depth counts root as 0, so 2 reaches d1/* but not d1/d2/*.
    let settings = LibrarySettings {
        max_depth: Some(2),
        ..LibrarySettings::default()
    };
    let rows = DirectorySource::new(dir.path(), settings).query().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert!(names.contains(&"root"));
    assert!(names.contains(&"one"));
    assert!(!names.contains(&"two"));
}

#[test]
fn directory_source_missing_root_is_not_found() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    let err = DirectorySource::new(&missing, LibrarySettings::default())
        .query()
        .unwrap_err();
    assert!(matches!(err, LibraryError::NotFound(p) if p == missing));
}

#[test]
fn directory_source_resolves_a_relative_root() {
    let source = DirectorySource::new("Music", LibrarySettings::default());
    assert!(source.root().is_absolute());
    assert_eq!(source.root(), std::env::current_dir().unwrap().join("Music"));
}
