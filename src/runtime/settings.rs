use crate::config;

/// Outcome of loading settings; the warning is logged once logging is up.
pub struct Loaded {
    pub settings: config::Settings,
    pub warning: Option<String>,
}

pub fn load_settings() -> Loaded {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => Loaded {
                settings: s,
                warning: None,
            },
            Err(e) => Loaded {
                settings: config::Settings::default(),
                warning: Some(format!("invalid config, using defaults: {e}")),
            },
        },
        // Config is optional; failures should not prevent the app from starting.
        Err(e) => Loaded {
            settings: config::Settings::default(),
            warning: Some(format!("failed to load config, using defaults: {e}")),
        },
    }
}
