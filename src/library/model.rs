use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

/// One playable audio item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    /// Position-derived identifier assigned by the scan (`1..=n`).
    pub id: u64,
    pub title: String,
    pub path: PathBuf,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    /// Unix seconds when the file entered the library.
    pub date_added: u64,
}

impl Track {
    /// `file://` URI for this track, used as its playable reference.
    pub fn uri(&self) -> String {
        path_to_uri(&self.path)
    }
}

/// A raw row as returned by a [`crate::library::TrackSource`], before ids are assigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackRow {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub date_added: u64,
}

impl TrackRow {
    pub(crate) fn into_track(self, id: u64) -> Track {
        Track {
            id,
            title: self.title,
            path: self.path,
            artist: self.artist,
            album: self.album,
            duration: self.duration,
            date_added: self.date_added,
        }
    }
}

/// `path` made absolute against the working directory; unchanged if that fails.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Render `path` as a `file://` URI. Relative paths are resolved against the
/// working directory first.
pub fn path_to_uri(path: &Path) -> String {
    let path = absolute_path(path);
    match Url::from_file_path(&path) {
        Ok(url) => url.to_string(),
        Err(()) => format!("file:///{}", path.display().to_string().trim_start_matches('/')),
    }
}

/// Resolve a `file://` URI back to a filesystem path.
///
/// Returns `None` for other schemes and for anything that does not parse.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let url = Url::parse(uri.trim()).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}
