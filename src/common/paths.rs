//! Configuration and report paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/caravel-tb/`
//! - macOS: `~/Library/Application Support/caravel-tb/`
//! - Windows: `%APPDATA%\caravel-tb\`

use std::path::PathBuf;

const APP_NAME: &str = "caravel-tb";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
