use std::path::PathBuf;

/// Application directory (`~/.tabpilot`).
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".tabpilot")
}

pub fn config_json_path() -> PathBuf {
    app_dir().join("config.json")
}

/// Default directory for stored conversations.
pub fn conversations_dir() -> PathBuf {
    app_dir().join("conversations")
}
