//! Playback engine.
//!
//! The engine owns a `rodio` output stream on a dedicated audio thread.
//! Callers drive it through the [`Engine`] trait; the thread answers with
//! [`EngineEvent`]s (ready, playing-changed, item-transition) on a channel
//! the runtime drains on its own thread.

mod engine;
mod error;
mod queue;
mod sink;
mod thread;
mod types;

pub use engine::{Engine, RodioEngine};
pub use error::EngineError;
pub use types::*;
