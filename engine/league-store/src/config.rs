//! Configuration for the league store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which record store backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    /// Process-local, lost on exit
    Memory,

    /// One JSON file per document under `data_dir`
    File,
}

/// Configuration for the league store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackendKind,

    /// Base directory for the file backend
    pub data_dir: PathBuf,

    /// Name of the predictions document
    pub predictions_document: String,

    /// Name of the results document
    pub results_document: String,

    /// How often the file backend re-reads watched documents for outside writes
    pub poll_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackendKind::File,
            data_dir: PathBuf::from("./data"),
            predictions_document: "predictions".to_string(),
            results_document: "results".to_string(),
            poll_interval_ms: 1000,
        }
    }
}

impl StoreConfig {
    /// Create a file-backed configuration rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Default::default() }
    }

    /// In-memory configuration, mostly for tests
    pub fn in_memory() -> Self {
        Self { backend: StoreBackendKind::Memory, ..Default::default() }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for name in [&self.predictions_document, &self.results_document] {
            if !is_valid_document_name(name) {
                return Err(format!("invalid document name: {name:?}"));
            }
        }

        if self.predictions_document == self.results_document {
            return Err("predictions and results must be different documents".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Document names double as file names, so keep them to a safe alphabet
pub fn is_valid_document_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
