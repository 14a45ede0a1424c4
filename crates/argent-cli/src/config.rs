use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use argent_ledger::LedgerConfig;
use argent_store::StoreConfig;

/// Storage root used when neither `--root` nor a config file names one.
pub const DEFAULT_ROOT: &str = "argent-data";

/// Combined store and ledger settings, read from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_store")]
    pub store: StoreConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            ledger: LedgerConfig::default(),
        }
    }
}

fn default_store() -> StoreConfig {
    StoreConfig::new(DEFAULT_ROOT)
}

impl CliConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text)
    }

    /// Config file (if any) with `--root` applied on top.
    pub fn resolve(path: Option<&Path>, root: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(root) = root {
            config.store.root = root;
        }
        Ok(config)
    }
}
