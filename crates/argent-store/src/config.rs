use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Default number of transactions per page.
pub const DEFAULT_PAGE_CAPACITY: usize = 50;
/// Default zstd level for every record.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Storage configuration. The root is always explicit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub root: PathBuf,
    #[serde(default = "default_page_capacity")]
    pub page_capacity: usize,
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_capacity: DEFAULT_PAGE_CAPACITY,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    pub fn with_page_capacity(mut self, page_capacity: usize) -> Self {
        self.page_capacity = page_capacity;
        self
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig("storage root is empty".into()));
        }
        if self.page_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "page_capacity must be at least 1".into(),
            ));
        }
        if !zstd::compression_level_range().contains(&self.compression_level) {
            return Err(StoreError::InvalidConfig(format!(
                "compression_level {} out of range",
                self.compression_level
            )));
        }
        Ok(())
    }
}

fn default_page_capacity() -> usize {
    DEFAULT_PAGE_CAPACITY
}

fn default_compression_level() -> i32 {
    DEFAULT_COMPRESSION_LEVEL
}
