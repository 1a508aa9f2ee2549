use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::config_json_path;

/// Wire format spoken by the configured provider endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// `messages` based chat completions.
    #[default]
    Chat,
    /// `input` item based responses.
    Responses,
}

impl ApiFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat" | "chat_completions" | "chat-completions" => Some(Self::Chat),
            "responses" | "response" => Some(Self::Responses),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Full endpoint URL the request body is POSTed to.
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub format: ApiFormat,
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Base URL of the tab-control service executing browser tools.
    #[serde(default)]
    pub tab_service_url: Option<String>,
    /// Directory conversations are stored in.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

const CONFIG_FILE_PATH: &str = "config.toml";

pub const DEFAULT_MAX_ROUNDS: usize = 25;

fn default_stream() -> bool {
    true
}

fn default_max_rounds() -> usize {
    DEFAULT_MAX_ROUNDS
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_some_and(|v| !v.is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: None,
            format: ApiFormat::Chat,
            stream: true,
            system_prompt: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_output_tokens: None,
            temperature: None,
            tab_service_url: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load from `~/.tabpilot/config.json`, falling back to `./config.toml`,
    /// then apply environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load_from(&config_json_path(), Path::new(CONFIG_FILE_PATH));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match std::fs::read_to_string(json_path) {
                Ok(content) => match serde_json::from_str::<Config>(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Failed to parse {}: {}", json_path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", json_path.display(), e),
            }
        }

        if toml_path.exists() {
            match std::fs::read_to_string(toml_path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Failed to parse {}: {}", toml_path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", toml_path.display(), e),
            }
        }

        Self::default()
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup("API_KEY") {
            self.api_key = Some(api_key);
        }
        if let Some(api_base) = lookup("API_BASE") {
            self.api_base = Some(api_base);
        }
        if let Some(model) = lookup("MODEL") {
            self.model = Some(model);
        }
        if let Some(format) = lookup("API_FORMAT") {
            match ApiFormat::parse(&format) {
                Some(format) => self.format = format,
                None => log::warn!("Ignoring unknown API_FORMAT '{}'", format),
            }
        }
        if let Some(stream) = lookup("STREAM") {
            self.stream = parse_bool_env(&stream);
        }
        if let Some(url) = lookup("TAB_SERVICE_URL") {
            self.tab_service_url = Some(url);
        }
    }

    /// Endpoint, key and model are all present.
    pub fn is_complete(&self) -> bool {
        non_empty(&self.api_base) && non_empty(&self.api_key) && non_empty(&self.model)
    }
}
