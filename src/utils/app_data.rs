use crate::ingest::StealPolicy;
use crate::tokenize::TokenizerKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "nidx";
const CONFIG_FILE: &str = "config.json";

/// Persisted defaults, stored as JSON in the app data directory.
///
/// CLI flags override every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tokenizer strategy used when `--strategy` is not given
    #[serde(default)]
    pub tokenizer: TokenizerKind,

    #[serde(default)]
    pub steal_policy: StealPolicy,

    /// Advise the kernel to drop each file's pages after it is loaded
    #[serde(default = "default_drop_page_cache")]
    pub drop_page_cache: bool,

    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

fn default_drop_page_cache() -> bool {
    true
}

fn default_show_progress() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerKind::default(),
            steal_policy: StealPolicy::default(),
            drop_page_cache: default_drop_page_cache(),
            show_progress: default_show_progress(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
