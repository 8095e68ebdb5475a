use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// MiniLM embedder using sentence-transformers/all-MiniLM-L6-v2.
///
/// Uses fastembed for ONNX-based inference. This model produces 384-dimensional
/// embeddings and truncates inputs at 256 word pieces.
pub struct MiniLmEmbedder {
    model: Mutex<TextEmbedding>,
}

impl MiniLmEmbedder {
    /// Create a new MiniLM embedder.
    ///
    /// Downloads the model on first use (~90MB).
    pub fn new() -> Result<Self> {
        let opts = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(true);

        TextEmbedding::try_new(opts)
            .map(|model| Self {
                model: Mutex::new(model),
            })
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))
    }
}

impl Embedder for MiniLmEmbedder {
    fn model_name(&self) -> &str {
        "sentence-transformers/all-MiniLM-L6-v2"
    }

    fn dimension(&self) -> usize {
        384
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_documents(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingUnavailable("model returned no embeddings".to_string()))
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::EmbeddingUnavailable("embedding model lock poisoned".to_string()))?;

        model
            .embed(texts, None)
            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires model download, run with: cargo test --features fastembed -- --ignored
    fn test_dimension_matches_output() {
        let embedder = MiniLmEmbedder::new().unwrap();
        let embedding = embedder.embed("Machine learning is an interesting field.").unwrap();
        assert_eq!(embedding.len(), embedder.dimension());
    }

    #[test]
    #[ignore] // Requires model download
    fn test_deterministic_for_identical_text() {
        let embedder = MiniLmEmbedder::new().unwrap();
        let a = embedder.embed("The weather is sunny today.").unwrap();
        let b = embedder.embed("The weather is sunny today.").unwrap();
        assert_eq!(a, b);
    }
}
