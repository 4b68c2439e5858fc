use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::store::{SortOrder, StoreOptions};

/// Recipe store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Recipe file the store is bound to
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// How recipe names are ordered after a load
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Write to a temp file and rename it over the target on save
    #[serde(default = "default_atomic_save")]
    pub atomic_save: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            sort_order: SortOrder::default(),
            atomic_save: default_atomic_save(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("recipes.txt")
}

fn default_atomic_save() -> bool {
    true
}

impl StoreConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPES__ prefix
    /// 2. recipes.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPES__SORT_ORDER=case_insensitive
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    pub fn options(&self) -> StoreOptions {
        StoreOptions {
            sort_order: self.sort_order,
            atomic_save: self.atomic_save,
        }
    }
}

/// See [`StoreConfig::load`].
pub fn load_config() -> Result<StoreConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipes").required(false))
        .add_source(
            Environment::with_prefix("RECIPES")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
