use std::{env, path::PathBuf};

use super::schema::Settings;

/// Settings failed validation.
#[derive(Debug, thiserror::Error)]
#[error("invalid setting `{key}`: {reason}")]
pub struct InvalidSetting {
    pub key: &'static str,
    pub reason: String,
}

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment
/// variables (prefix `SIMPLAY__`), and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SIMPLAY")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), InvalidSetting> {
        if self.controls.seek_seconds == 0 {
            return Err(InvalidSetting {
                key: "controls.seek_seconds",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.library.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(InvalidSetting {
                key: "library.extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        if self.mpris.identity.trim().is_empty() {
            return Err(InvalidSetting {
                key: "mpris.identity",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Resolve the config path from `SIMPLAY_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SIMPLAY_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/simplay/config.toml`
/// or `~/.config/simplay/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("simplay").join("config.toml"))
}

/// Compute the default log path under `$XDG_STATE_HOME/simplay/simplay.log`
/// or `~/.local/state/simplay/simplay.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("simplay").join("simplay.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(dir) = env::var_os(var) {
        Some(PathBuf::from(dir))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
