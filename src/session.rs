//! Playback session: the single owner of playback state.
//!
//! The session translates transport commands (load/play/pause/seek/skip/stop)
//! into [`Engine`](crate::audio::Engine) calls, mirrors engine events back
//! into its state, and keeps the desktop media session, the notification and
//! the UI's [`StateCell`] in step after every transition.

mod cell;
mod playback;
mod publish;
mod state;

pub use cell::StateCell;
pub use playback::PlaybackSession;
pub use publish::{MediaSession, NotificationAction, NotificationContent, Notifier};
pub use state::{NowPlaying, PlaybackState, SessionSnapshot};
