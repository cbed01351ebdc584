use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the playlist recommendation backend
    pub backend_url: String,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Transcript length cap; oldest messages are dropped past this
    pub max_messages: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: "http://localhost:8000".to_string(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig { max_messages: 200 }
    }
}

impl Config {
    /// Load configuration from `~/.moodlist/config.toml`, creating the
    /// directory (but not the file) if needed.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let moodlist_home = home.join(".moodlist");
        let config_path = moodlist_home.join("config.toml");

        fs::create_dir_all(&moodlist_home).context("Failed to create .moodlist directory")?;

        let config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            // First run: write the defaults so the file is discoverable.
            let config = Config::default();
            config.save()?;
            config
        };

        Ok(config)
    }

    /// Save configuration to `~/.moodlist/config.toml`.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".moodlist").join("config.toml"))
    }
}
