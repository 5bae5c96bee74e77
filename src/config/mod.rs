//! Configuration management for memo

pub mod schema;

pub use schema::Config;

use crate::error::{MemoError, MemoResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the project-local config override
pub const LOCAL_CONFIG_FILE: &str = ".memo.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memo")
            .join("config.toml")
    }

    /// Walk up from `start` looking for a project-local config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, falling back to defaults if the file does not exist
    pub async fn load(&self) -> MemoResult<Config> {
        self.load_merged(None).await
    }

    /// Load the global config with an optional local file layered on top
    ///
    /// Keys set in the local file win; tables are merged recursively so a
    /// local file only needs the keys it overrides.
    pub async fn load_merged(&self, local: Option<&Path>) -> MemoResult<Config> {
        let global = if self.config_path.exists() {
            self.read_table(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            toml::Table::new()
        };

        let Some(local) = local else {
            return parse_table(global, &self.config_path);
        };

        debug!("Applying local config {}", local.display());
        let overrides = self.read_table(local).await?;

        let mut merged = global.clone();
        merge_tables(&mut merged, overrides);
        match parse_table(merged, local) {
            Ok(config) => Ok(config),
            // Blame the global file if it is broken without the overrides
            Err(local_err) => match parse_table(global, &self.config_path) {
                Ok(_) => Err(local_err),
                Err(global_err) => Err(global_err),
            },
        }
    }

    async fn read_table(&self, path: &Path) -> MemoResult<toml::Table> {
        let content = read_config(path).await?;
        toml::from_str(&content).map_err(|e| MemoError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> MemoResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            MemoError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> MemoResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_config(path: &Path) -> MemoResult<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| MemoError::io(format!("reading config from {}", path.display()), e))
}

fn parse_table(table: toml::Table, path: &Path) -> MemoResult<Config> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| MemoError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Recursively merge `overrides` into `base`
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}
