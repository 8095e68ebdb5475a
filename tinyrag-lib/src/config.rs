//! Pipeline configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! max_chunk_size = 300
//! chunk_overlap = 50
//! separators = ["\n\n", "\n", ". ", " "]
//! top_k = 4
//! storage_path = "vectorstore/store.json"
//! metric = "cosine"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::{RecursiveChunker, DEFAULT_SEPARATORS};
use crate::store::{MemoryStore, Metric};
use crate::{Error, Result};

/// Default maximum chunk size in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 100;

/// Default target overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;

/// Default number of results per query.
pub const DEFAULT_TOP_K: usize = 2;

/// Settings for chunking, retrieval and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum chunk length in characters
    pub max_chunk_size: usize,
    /// Target overlap between adjacent chunks, best-effort
    pub chunk_overlap: usize,
    /// Split points from most to least preferred
    pub separators: Vec<String>,
    /// Results returned when the caller doesn't ask for a count
    pub top_k: usize,
    /// Snapshot file for persist/load
    pub storage_path: Option<PathBuf>,
    /// Similarity used for ranking
    pub metric: Metric,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
            top_k: DEFAULT_TOP_K,
            storage_path: None,
            metric: Metric::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::InvalidConfiguration(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Check chunking parameters and the default result count.
    pub fn validate(&self) -> Result<()> {
        self.chunker()?;
        if self.top_k == 0 {
            return Err(Error::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the chunker described by this configuration.
    pub fn chunker(&self) -> Result<RecursiveChunker> {
        RecursiveChunker::new(
            self.max_chunk_size,
            self.chunk_overlap,
            self.separators.iter().cloned(),
        )
    }

    /// Build an empty store with this configuration's metric and storage path.
    #[must_use]
    pub fn store(&self) -> MemoryStore {
        let store = MemoryStore::new().with_metric(self.metric);
        match &self.storage_path {
            Some(path) => store.with_storage_path(path),
            None => store,
        }
    }
}
