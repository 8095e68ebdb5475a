//! tinyrag - chunking and exact vector-store retrieval
//!
//! # Architecture
//!
//! ```text
//! Document -> Chunker -> Embedder -> Store
//!                                      |
//! Query -> Embedder -> Search <--------+
//!                         |
//!                      Results
//! ```
//!
//! # Example
//!
//! ```
//! use tinyrag_lib::{config::PipelineConfig, embed::HashEmbedder, pipeline::RetrievalPipeline};
//!
//! let config = PipelineConfig::default();
//! let pipeline = RetrievalPipeline::from_config(&config, HashEmbedder::default())?;
//!
//! // Index a document
//! let added = pipeline.ingest("notes", "The weather is sunny today.\nNeural networks can solve complex problems.")?;
//! assert_eq!(added, 1);
//!
//! // Search
//! let results = pipeline.answer("Is it sunny?", 2)?;
//! assert_eq!(results.len(), 1);
//! # Ok::<(), tinyrag_lib::Error>(())
//! ```

pub mod chunk;
pub mod config;
pub mod embed;
pub mod error;
pub mod pipeline;
pub mod store;

pub use error::{Error, Result};
