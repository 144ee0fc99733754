use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/simplay/config.toml` or `~/.config/simplay/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SIMPLAY__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub library: LibrarySettings,
    pub notifications: NotificationSettings,
    pub mpris: MprisSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Move the list cursor along with the playing track.
    pub follow_playback: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " simplay ~ just press play ".to_string(),
            follow_playback: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to seek when pressing `H` / `L`.
    pub seek_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { seek_seconds: 10 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Show a desktop notification with transport actions while playing.
    pub enabled: bool,
    /// Notification summary line; the body carries the track title.
    pub summary: String,
    /// Expiry passed to the notification daemon (-1 = server default, 0 = never).
    pub expire_timeout_ms: i32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            summary: "Now playing".to_string(),
            expire_timeout_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MprisSettings {
    /// Publish the player on the session bus.
    pub enabled: bool,
    /// Identity shown by MPRIS clients; also the bus name suffix.
    pub identity: String,
}

impl Default for MprisSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            identity: "simplay".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset. Defaults to `info`.
    pub level: Option<String>,
    /// Log file path. Defaults to `$XDG_STATE_HOME/simplay/simplay.log`.
    pub file: Option<std::path::PathBuf>,
}
