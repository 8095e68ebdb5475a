//! Vector storage backends
//!
//! # Storage Model
//!
//! Each stored record consists of:
//! - Id: assigned by the store at insertion, increasing
//! - Chunk: the original text, document id and position
//! - Embedding: the vector representation
//!
//! Every vector in a store has the same dimension. It is fixed by the first
//! insertion and never changes afterwards.
//!
//! # Usage
//!
//! ```
//! use tinyrag_lib::chunk::Chunk;
//! use tinyrag_lib::store::{MemoryStore, VectorStore};
//!
//! let store = MemoryStore::new();
//! let chunk = Chunk {
//!     text: "hello".to_string(),
//!     start_offset: 0,
//!     document_id: "greeting".to_string(),
//!     sequence_index: 0,
//! };
//!
//! // Insert chunks with their embeddings
//! store.insert(&[chunk], vec![vec![1.0, 0.0]]).unwrap();
//!
//! // Search by vector similarity
//! let results = store.search(&[1.0, 0.0], 5).unwrap();
//! assert_eq!(results[0].chunk.text, "hello");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::Chunk;
use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// A search result with similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Id of the matched record
    pub id: u64,
    /// The matched chunk
    pub chunk: Chunk,
    /// Similarity score (higher is more similar)
    /// For cosine similarity: -1.0 to 1.0
    pub score: f32,
}

/// Similarity measure used to rank records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `dot(a, b) / (|a| * |b|)`, in [-1, 1]
    #[default]
    Cosine,
    /// `1 / (1 + |a - b|)`, in (0, 1]
    Euclidean,
}

impl Metric {
    /// Score `b` against `a`; higher means more similar.
    #[must_use]
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        let score = match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        };
        // -0.0 + 0.0 == +0.0, so orthogonal vectors tie regardless of sign
        score + 0.0
    }
}

/// Trait for vector storage backends
///
/// Mutating operations are serialized against each other; searches may run
/// concurrently and observe each insertion batch either entirely or not at
/// all.
pub trait VectorStore: Send + Sync {
    /// Insert chunks with their embeddings as one atomic batch
    ///
    /// # Arguments
    /// * `chunks` - The text chunks to store
    /// * `embeddings` - Corresponding embeddings (must be same length)
    ///
    /// # Returns
    /// Number of records added. If any embedding fails validation, nothing
    /// from the batch is stored.
    fn insert(&self, chunks: &[Chunk], embeddings: Vec<Embedding>) -> Result<usize>;

    /// Embed `chunks` of one document and insert them as a single batch
    ///
    /// Embedding happens before the store is locked, so slow models never
    /// block readers. An embedding failure leaves the store untouched.
    fn add(&self, embedder: &dyn Embedder, document_id: &str, chunks: &[Chunk]) -> Result<usize> {
        if let Some(stray) = chunks.iter().find(|c| c.document_id != document_id) {
            return Err(Error::InvalidArgument(format!(
                "chunk {} belongs to document '{}', not '{document_id}'",
                stray.sequence_index, stray.document_id
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = embedder.embed_documents(&texts)?;
        debug!(document_id, count = embeddings.len(), "embedded chunks");

        self.insert(chunks, embeddings)
    }

    /// Search for similar chunks
    ///
    /// # Arguments
    /// * `query_embedding` - The query vector
    /// * `k` - Maximum number of results, must be positive
    ///
    /// # Returns
    /// Top-k results sorted by similarity (highest first), ties going to the
    /// earlier-inserted record. An empty store yields no results.
    fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Get total number of stored records
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed vector dimension, once the first record has been stored
    fn dimension(&self) -> Option<usize>;

    /// Remove every record of a document, returning how many were removed
    fn remove_document(&self, document_id: &str) -> Result<usize>;

    /// Clear all stored records
    fn clear(&self) -> Result<()>;

    /// Write a durable snapshot of all records
    fn persist(&self) -> Result<()>;

    /// Replace the store's contents with the last persisted snapshot
    fn load(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction.
/// Zero vectors score 0.0 against everything.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Euclidean distance between two vectors.
#[must_use]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

mod memory;
mod snapshot;

pub use memory::*;
