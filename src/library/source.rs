use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::error::LibraryError;
use super::model::TrackRow;

/// Read-only query capability over some index of audio files.
pub trait TrackSource: Send {
    fn query(&self) -> Result<Vec<TrackRow>, LibraryError>;
}

/// Indexes audio files below a root directory.
#[derive(Clone)]
pub struct DirectorySource {
    root: PathBuf,
    settings: LibrarySettings,
}

impl DirectorySource {
    /// Relative roots are resolved against the working directory so track
    /// paths (and their URIs) are absolute.
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        let root = root.into();
        let root = match std::path::absolute(&root) {
            Ok(abs) => abs,
            Err(e) => {
                warn!(root = %root.display(), "cannot resolve library root: {e}");
                root
            }
        };
        Self { root, settings }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TrackSource for DirectorySource {
    fn query(&self) -> Result<Vec<TrackRow>, LibraryError> {
        // Probe the root up front so a refused directory is reported, not walked as empty.
        fs::read_dir(&self.root).map_err(|e| LibraryError::from_io(self.root.clone(), e))?;

        let settings = &self.settings;
        let mut walker = WalkDir::new(&self.root).follow_links(settings.follow_links);

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        let mut rows = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if path.is_file() && is_audio_file(path, settings) {
                rows.push(read_row(path));
            }
        }

        Ok(rows)
    }
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|e| !e.is_empty() && e == ext)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn date_added(path: &Path) -> u64 {
    let Ok(meta) = fs::metadata(path) else {
        return 0;
    };
    meta.created()
        .or_else(|_| meta.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn non_blank(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_row(path: &Path) -> TrackRow {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist = None;
    let mut album = None;
    let mut duration: Option<Duration> = None;

    if let Ok(tagged) = lofty::read_from_path(path) {
        duration = Some(tagged.properties().duration()).filter(|d| !d.is_zero());

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(t) = non_blank(tag.title()) {
                title = t;
            }
            artist = non_blank(tag.artist());
            album = non_blank(tag.album());
        }
    }

    TrackRow {
        path: path.to_path_buf(),
        title,
        artist,
        album,
        duration,
        date_added: date_added(path),
    }
}

