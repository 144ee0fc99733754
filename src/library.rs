//! Music library: track model, directory source and the one-shot scan.
//!
//! A scan reads every indexed track from a [`TrackSource`], orders it by
//! date added and publishes the whole list at once. Failures never surface
//! to callers; they produce an empty list.

mod error;
mod model;
mod scan;
mod source;

pub use error::LibraryError;
pub use model::*;
pub use scan::{LibraryEvent, ScanOutcome, scan, spawn_scan};
pub use source::{DirectorySource, TrackSource};

#[cfg(test)]
mod tests;
