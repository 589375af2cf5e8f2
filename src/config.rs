use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};
use crate::locale::Language;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8787";
pub const DEFAULT_CHAT_PATH: &str = "/api/chat";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const APP_DIR: &str = "chatline";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub chat_path: Option<String>,
    pub language: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            chat_path: Some(DEFAULT_CHAT_PATH.to_string()),
            language: Some(Language::default().as_str().to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", config_path, e))?;
        Ok(config)
    }

    /// Apply environment overrides, which win over the file.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("CHATLINE_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Ok(path) = std::env::var("CHATLINE_CHAT_PATH") {
            self.chat_path = Some(path);
        }
        if let Ok(language) = std::env::var("CHATLINE_LANGUAGE") {
            self.language = Some(language);
        }
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn chat_path(&self) -> &str {
        self.chat_path.as_deref().unwrap_or(DEFAULT_CHAT_PATH)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Unknown language codes fall back to the default rather than failing.
    pub fn language(&self) -> Language {
        self.language
            .as_deref()
            .and_then(Language::from_str)
            .unwrap_or_default()
    }

    /// Full URL of the chat endpoint.
    pub fn endpoint_url(&self) -> String {
        let base = self.base_url().trim_end_matches('/');
        let path = self.chat_path();
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join(APP_DIR).join("config.json"))
    }

    /// Directory for local storage and logs.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(data_dir.join(APP_DIR))
    }
}
