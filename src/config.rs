//! Paths and persisted settings.
//!
//! Directory priority (config and data alike):
//! 1. CLI `--config-dir`
//! 2. `REELPLAY_CONFIG_DIR` environment variable
//! 3. Current directory, if it already holds `reelplay.json` or `reelplay.log`
//! 4. Platform directory from dirs-next
//!    - Linux: `~/.config/reelplay`, `~/.local/share/reelplay`
//!    - macOS: `~/Library/Application Support/reelplay`
//!    - Windows: `%APPDATA%\reelplay`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::layout::MOBILE_BREAKPOINT_PX;

const APP_DIR: &str = "reelplay";
pub const SETTINGS_FILE: &str = "reelplay.json";
pub const LOG_FILE: &str = "reelplay.log";

/// Override for default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// CLI argument first, then `REELPLAY_CONFIG_DIR`
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir =
            cli_dir.or_else(|| std::env::var("REELPLAY_CONFIG_DIR").ok().map(PathBuf::from));
        Self { config_dir }
    }
}

pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir).join(name)
}

pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir).join(name)
}

/// Create config and data directories if missing
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir);
    let data_dir = resolve_dir(config, dirs_next::data_dir);
    for dir in [&config_dir, &data_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform: fn() -> Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(cwd) = std::env::current_dir()
        && has_local_files(&cwd)
    {
        return cwd;
    }
    platform()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Persisted tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Input
    pub keyboard_cooldown_ms: u64,
    pub press_cooldown_ms: u64,
    pub press_move_threshold_px: f32,

    // Layout
    pub mobile_breakpoint_px: u32,

    // Playback
    pub start_muted: bool,

    // Items
    pub initial_window: usize, // Items mounted before the viewer moves
    pub api_base_url: String,
    pub site: Option<String>,
    pub fetch_retries: u32,
    pub fetch_retry_delay_ms: u64,

    /// Player SDK script, loaded once per page
    pub player_script_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keyboard_cooldown_ms: 500,
            press_cooldown_ms: 400,
            press_move_threshold_px: 30.0,
            mobile_breakpoint_px: MOBILE_BREAKPOINT_PX,
            start_muted: false,
            initial_window: 3,
            api_base_url: "http://localhost:3000".to_string(),
            site: None,
            fetch_retries: 3,
            fetch_retry_delay_ms: 1000,
            player_script_url: "https://assets.mediadelivery.net/playerjs/playerjs-latest.min.js"
                .to_string(),
        }
    }
}

impl Settings {
    /// Load from `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_dir_wins() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("a.json", &config), PathBuf::from("/custom/a.json"));
        assert_eq!(data_file("b.log", &config), PathBuf::from("/custom/b.log"));
    }

    #[test]
    fn test_cli_dir_beats_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from-cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from-cli")));
    }

    #[test]
    fn test_settings_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_settings_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"keyboard_cooldown_ms": 250, "start_muted": true}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.keyboard_cooldown_ms, 250);
        assert!(settings.start_muted);
        assert_eq!(settings.press_cooldown_ms, 400);
    }

    #[test]
    fn test_settings_roundtrip_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = PathConfig {
            config_dir: Some(dir.path().join("nested")),
        };
        ensure_dirs(&config).unwrap();
        let path = config_file(SETTINGS_FILE, &config);
        let mut settings = Settings::default();
        settings.mobile_breakpoint_px = 600;
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_settings_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ nope").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
