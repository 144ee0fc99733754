use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::model::Track;
use super::source::TrackSource;

/// Result of one scan: the full track list, plus whether access was refused.
#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    pub tracks: Vec<Track>,
    /// The source refused access; `tracks` is empty.
    pub blocked: bool,
}

/// Messages published by a background scan.
#[derive(Debug)]
pub enum LibraryEvent {
    /// Replace the whole list with this outcome.
    Scanned(ScanOutcome),
}

/// Query `source` once and return every track ordered by date added (oldest first).
///
/// Any failure yields an empty outcome; there is no retry and no partial result.
pub fn scan(source: &dyn TrackSource) -> ScanOutcome {
    let mut rows = match source.query() {
        Ok(rows) => rows,
        Err(e) => {
            warn!("library scan failed: {e}");
            return ScanOutcome {
                tracks: Vec::new(),
                blocked: e.is_permission_denied(),
            };
        }
    };

    rows.sort_by(|a, b| {
        a.date_added
            .cmp(&b.date_added)
            .then_with(|| a.path.cmp(&b.path))
    });

    let tracks: Vec<Track> = rows
        .into_iter()
        .zip(1u64..)
        .map(|(row, id)| row.into_track(id))
        .collect();

    debug!(count = tracks.len(), "library scan finished");
    ScanOutcome {
        tracks,
        blocked: false,
    }
}

/// Run [`scan`] on a worker thread and send a single [`LibraryEvent::Scanned`].
pub fn spawn_scan<S>(source: S, tx: Sender<LibraryEvent>) -> JoinHandle<()>
where
    S: TrackSource + 'static,
{
    thread::spawn(move || {
        let outcome = scan(&source);
        info!(
            count = outcome.tracks.len(),
            blocked = outcome.blocked,
            "library scanned"
        );
        // The receiver is gone when the app quit mid-scan.
        let _ = tx.send(LibraryEvent::Scanned(outcome));
    })
}
