//! Text embedding
//!
//! The embedding model is a collaborator behind the [`Embedder`] trait:
//! text in, fixed-length vector out, deterministic for identical input.
//!
//! - [`HashEmbedder`]: feature-hashing stand-in, no model required
//! - `MiniLmEmbedder`: sentence-transformers/all-MiniLM-L6-v2 through
//!   fastembed (ONNX runtime), enabled with the `fastembed` feature
//!
//! # Usage
//!
//! ```
//! use tinyrag_lib::embed::{Embedder, HashEmbedder};
//!
//! let embedder = HashEmbedder::new(384);
//!
//! let doc_embeddings = embedder
//!     .embed_documents(&["RAG systems combine retrieval with generation.", "The weather is sunny today."])
//!     .unwrap();
//! let query_embedding = embedder.embed_query("What do RAG systems combine?").unwrap();
//!
//! assert_eq!(doc_embeddings.len(), 2);
//! assert_eq!(query_embedding.len(), embedder.dimension());
//! ```

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
///
/// Methods take `&self` so one embedder can serve concurrent queries;
/// implementations that need exclusive access to a model lock internally.
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    ///
    /// Fails with [`Error::EmbeddingUnavailable`](crate::Error::EmbeddingUnavailable)
    /// when the underlying model can't be reached or loaded.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embed multiple documents for indexing
    ///
    /// Returns one embedding per input, in input order. Models that batch
    /// more efficiently should override this.
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Embed a single query for searching
    fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.embed(text)
    }

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text)
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        (**self).embed_documents(texts)
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        (**self).embed_query(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text)
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        (**self).embed_documents(texts)
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        (**self).embed_query(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

mod hash;
#[cfg(feature = "fastembed")]
mod minilm;

pub use hash::*;
#[cfg(feature = "fastembed")]
pub use minilm::*;
