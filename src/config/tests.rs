use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_simplay_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("SIMPLAY_CONFIG_PATH", "/tmp/simplay-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/simplay-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("simplay")
            .join("config.toml")
    );
}

#[test]
fn default_paths_fall_back_to_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::remove("XDG_STATE_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.config/simplay/config.toml")
    );
    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/simplay/simplay.log")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
quit_fade_out_ms = 0

[controls]
seek_seconds = 30

[ui]
header_text = "hello"
follow_playback = false

[library]
extensions = ["flac"]
recursive = false
include_hidden = false
follow_links = false
max_depth = 3

[notifications]
enabled = false
summary = "Playing"
expire_timeout_ms = 5000

[mpris]
identity = "myplayer"

[logging]
level = "debug"
file = "/tmp/simplay.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SIMPLAY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("SIMPLAY__CONTROLS__SEEK_SECONDS");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.quit_fade_out_ms, 0);
    assert_eq!(s.controls.seek_seconds, 30);
    assert_eq!(s.ui.header_text, "hello");
    assert!(!s.ui.follow_playback);
    assert_eq!(s.library.extensions, vec!["flac".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.max_depth, Some(3));
    assert!(!s.notifications.enabled);
    assert_eq!(s.notifications.summary, "Playing");
    assert_eq!(s.notifications.expire_timeout_ms, 5000);
    assert!(s.mpris.enabled);
    assert_eq!(s.mpris.identity, "myplayer");
    assert_eq!(s.logging.level.as_deref(), Some("debug"));
    assert_eq!(
        s.logging.file.as_deref(),
        Some(std::path::Path::new("/tmp/simplay.log"))
    );
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[controls]
seek_seconds = 30
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SIMPLAY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("SIMPLAY__CONTROLS__SEEK_SECONDS", "5");

    let s = Settings::load().unwrap();
    assert_eq!(s.controls.seek_seconds, 5);
}

#[test]
fn validate_rejects_zero_seek_and_empty_extensions() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.controls.seek_seconds = 0;
    assert_eq!(s.validate().unwrap_err().key, "controls.seek_seconds");

    s.controls.seek_seconds = 5;
    s.library.extensions = vec!["  ".to_string()];
    assert_eq!(s.validate().unwrap_err().key, "library.extensions");
}

#[test]
fn effective_settings_render_as_toml() {
    let text = Settings::default().to_toml().unwrap();
    assert!(text.contains("[controls]"));
    assert!(text.contains("seek_seconds = 10"));
    assert!(text.contains("[mpris]"));
}
