//! Optional settings file in the user's config directory.
//!
//! `~/.config/guestbook/settings.json` (or the platform equivalent) may set
//! any subset of the client options; environment variables and command-line
//! flags take precedence over it.

use std::fs;
use std::path::PathBuf;

use guestbook_models::NetworkType;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const APP_DIR: &str = "guestbook";
const SETTINGS_FILE: &str = "settings.json";
const LOG_FILE: &str = "guestbook.log";

/// File-level overrides; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc_url: Option<String>,
    pub wallet_url: Option<String>,
    pub network: Option<NetworkType>,
    pub contract: Option<String>,
    pub app_name: Option<String>,
    pub confirm_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub clear_on_success: Option<bool>,
}

/// The config directory for the application, created if needed.
pub fn config_dir() -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join(APP_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir).ok()?;
    }
    Some(dir)
}

/// Where the interactive client writes its log.
pub fn log_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(LOG_FILE))
}

fn settings_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(SETTINGS_FILE))
}

/// Load the settings file; a missing or unreadable file yields defaults.
pub fn load_settings() -> Settings {
    let Some(path) = settings_path() else {
        warn!("could not determine config directory");
        return Settings::default();
    };
    if !path.exists() {
        debug!(path = %path.display(), "no settings file");
        return Settings::default();
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<Settings>(&content) {
            Ok(settings) => {
                info!(path = %path.display(), "settings loaded");
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse settings");
                Settings::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read settings");
            Settings::default()
        }
    }
}

/// Write the settings file, returning where it was written.
pub fn save_settings(settings: &Settings) -> std::io::Result<PathBuf> {
    let path = settings_path().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory")
    })?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json)?;
    info!(path = %path.display(), "settings saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_missing_fields_with_none() {
        let s: Settings = serde_json::from_str(r#"{ "network": "ghostnet" }"#).unwrap();
        assert_eq!(s.network, Some(NetworkType::Ghostnet));
        assert_eq!(s.rpc_url, None);
        assert_eq!(s.clear_on_success, None);
    }

    #[test]
    fn empty_object_is_default() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Settings::default());
    }
}
