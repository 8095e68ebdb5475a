//! Retrieval pipeline
//!
//! Combines chunker, embedder and store into ingest/answer operations.
//!
//! # Usage
//!
//! ```
//! use tinyrag_lib::config::PipelineConfig;
//! use tinyrag_lib::embed::HashEmbedder;
//! use tinyrag_lib::pipeline::RetrievalPipeline;
//!
//! let pipeline = RetrievalPipeline::from_config(&PipelineConfig::default(), HashEmbedder::default()).unwrap();
//! pipeline.ingest("notes", "RAG systems combine retrieval with generation.").unwrap();
//!
//! let results = pipeline.answer("What do RAG systems combine?", 2).unwrap();
//! assert_eq!(results.len(), 1);
//! ```

use tracing::{debug, info};

use crate::chunk::{Chunker, RecursiveChunker};
use crate::config::PipelineConfig;
use crate::embed::Embedder;
use crate::store::{MemoryStore, SearchResult, VectorStore};
use crate::{Error, Result};

/// Whether anything has been ingested yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing ingested, no dimension fixed
    Empty,
    /// A document was ingested; stays so after removals
    Populated,
}

/// Ingestion and query front door over an owned store.
pub struct RetrievalPipeline<E: Embedder, S: VectorStore = MemoryStore> {
    chunker: RecursiveChunker,
    embedder: E,
    store: S,
    top_k: usize,
}

impl<E: Embedder> RetrievalPipeline<E, MemoryStore> {
    /// Create a pipeline with an empty [`MemoryStore`] built from `config`.
    ///
    /// The store is not loaded from `storage_path`; call [`load`](Self::load)
    /// to restore a snapshot.
    pub fn from_config(config: &PipelineConfig, embedder: E) -> Result<Self> {
        Self::new(config, embedder, config.store())
    }
}

impl<E: Embedder, S: VectorStore> RetrievalPipeline<E, S> {
    /// Create a pipeline over an existing store.
    pub fn new(config: &PipelineConfig, embedder: E, store: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunker: config.chunker()?,
            embedder,
            store,
            top_k: config.top_k,
        })
    }

    /// Chunk, embed and store a document.
    ///
    /// Returns the number of chunks stored. Empty and whitespace-only
    /// documents store nothing. On failure nothing from this document is
    /// kept.
    pub fn ingest(&self, document_id: &str, raw_text: &str) -> Result<usize> {
        let chunks = self.chunker.chunk(raw_text, document_id);
        if chunks.is_empty() {
            debug!(document_id, "document has no content");
            return Ok(0);
        }

        let added = self.store.add(&self.embedder, document_id, &chunks)?;
        info!(document_id, chunks = added, total = self.store.len(), "ingested document");
        Ok(added)
    }

    /// Return the `k` chunks most similar to `question`, best first.
    ///
    /// An empty store answers with no results rather than an error. A blank
    /// question is rejected with [`Error::InvalidArgument`].
    pub fn answer(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be greater than zero".to_string()));
        }
        if question.trim().is_empty() {
            return Err(Error::InvalidArgument("question is blank".to_string()));
        }
        if self.store.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_query(question)?;
        self.store.search(&query_embedding, k)
    }

    /// [`answer`](Self::answer) with the configured `top_k`.
    pub fn answer_default(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.answer(question, self.top_k)
    }

    /// Remove every chunk of a document.
    pub fn remove_document(&self, document_id: &str) -> Result<usize> {
        self.store.remove_document(document_id)
    }

    /// Write the store's snapshot.
    pub fn persist(&self) -> Result<()> {
        self.store.persist()
    }

    /// Replace the store's contents with its last snapshot.
    pub fn load(&self) -> Result<()> {
        self.store.load()
    }

    /// `Populated` once the store has fixed its dimension. Removing documents
    /// or clearing the store does not go back to `Empty`.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        match self.store.dimension() {
            Some(_) => PipelineState::Populated,
            None => PipelineState::Empty,
        }
    }

    /// Returns the number of stored chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no chunks are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[must_use]
    pub fn chunker(&self) -> &RecursiveChunker {
        &self.chunker
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the pipeline, handing back its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}
