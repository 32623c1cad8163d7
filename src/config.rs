use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::clipboard;

/// Subtitle language used when neither the CLI nor the config names one
pub const DEFAULT_LANG: &str = "ru";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub proxy: Option<String>,
    pub timeout_secs: Option<u64>,
    pub clipboard_command: Option<Vec<String>>,
}

impl Config {
    /// Load config from ~/.config/yt2md/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// CLI value first, then config, then the built-in default
    pub fn lang(&self, cli: Option<&str>) -> String {
        cli.or(self.default_lang.as_deref()).unwrap_or(DEFAULT_LANG).to_string()
    }

    pub fn proxy<'a>(&'a self, cli: Option<&'a str>) -> Option<&'a str> {
        cli.or(self.proxy.as_deref())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn clipboard_command(&self) -> Vec<String> {
        match &self.clipboard_command {
            Some(cmd) if !cmd.is_empty() => cmd.clone(),
            _ => vec![clipboard::DEFAULT_COMMAND.to_string()],
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("yt2md")
        .join("config.toml")
}
