use crate::embed::{Embedder, Embedding};
use crate::Result;

/// Default dimension, matching all-MiniLM-L6-v2.
pub const DEFAULT_HASH_DIMENSION: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Feature-hashing embedder.
///
/// Lowercased words and their character trigrams are hashed into signed
/// buckets and the result is L2-normalized. No model, no network: the same
/// text always yields the same vector, on every platform and toolchain.
/// Useful for tests and offline demos; it captures lexical overlap only.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hashing embedder producing `dimension`-length vectors.
    ///
    /// A dimension of zero is bumped to one.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "feature-hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut vector = vec![0.0; self.dimension];

        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase);

        for word in words {
            self.add_feature(&mut vector, &word, 1.0);

            let padded: Vec<char> = format!("<{word}>").chars().collect();
            for trigram in padded.windows(3) {
                let trigram: String = trigram.iter().collect();
                self.add_feature(&mut vector, &trigram, 0.5);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_fixed_dimension() {
        let embedder = HashEmbedder::new(64);
        assert_eq!(embedder.embed("hello world").unwrap().len(), 64);
        assert_eq!(embedder.embed("").unwrap().len(), 64);
        assert_eq!(embedder.dimension(), 64);
    }

    #[test]
    fn test_deterministic() {
        let a = HashEmbedder::default().embed("The weather is sunny today.").unwrap();
        let b = HashEmbedder::default().embed("The weather is sunny today.").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unit_length() {
        let v = HashEmbedder::default().embed("Neural networks can solve complex problems.").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashEmbedder::new(16).embed("   ").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Machine learning!").unwrap();
        let b = embedder.embed("machine LEARNING").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lexical_overlap_scores_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("sunny weather").unwrap();
        let related = embedder.embed("The weather is sunny today.").unwrap();
        let unrelated = embedder.embed("Vector databases make searches fast.").unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_zero_dimension_is_bumped() {
        assert_eq!(HashEmbedder::new(0).dimension(), 1);
    }

    #[test]
    fn test_documents_match_single_embeds() {
        let embedder = HashEmbedder::new(32);
        let batch = embedder.embed_documents(&["alpha", "beta"]).unwrap();
        assert_eq!(batch[0], embedder.embed("alpha").unwrap());
        assert_eq!(batch[1], embedder.embed("beta").unwrap());
    }
}
