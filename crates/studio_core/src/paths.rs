use std::path::{Path, PathBuf};

/// Default studio data directory (~/.ai-studio)
pub fn studio_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".ai-studio")
}

/// config.toml inside a data directory
pub fn config_toml_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Directory holding persisted records (history, transcript)
pub fn records_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("records")
}
