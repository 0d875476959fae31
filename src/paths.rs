// ABOUTME: XDG Base Directory paths for the deskchat config file and logs
// ABOUTME: Falls back to the working directory when no home directory is known

use directories::ProjectDirs;
use std::path::PathBuf;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "deskchat";
const APPLICATION: &str = "deskchat";

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Data directory (e.g., ~/.local/share/deskchat/)
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Rolling log files live here (e.g., ~/.local/share/deskchat/logs/)
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Config directory (e.g., ~/.config/deskchat/)
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// e.g. ~/.config/deskchat/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
