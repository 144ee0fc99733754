//! Application module: the view state rendered by the TUI.
//!
//! `ViewState` lives in `app::model` and mirrors the library and the
//! playback session into display-ready fields.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
