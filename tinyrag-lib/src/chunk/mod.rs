//! Document chunking
//!
//! Documents are split into bounded-size, possibly overlapping chunks that
//! become the unit of embedding and retrieval. Sizes and offsets are counted
//! in characters (Unicode scalar values), not bytes.
//!
//! # Usage
//!
//! ```
//! use tinyrag_lib::chunk::{Chunker, RecursiveChunker};
//!
//! let chunker = RecursiveChunker::new(50, 10, ["\n\n", "\n", "."]).unwrap();
//! let chunks = chunker.chunk("First paragraph.\n\nSecond paragraph.", "doc-1");
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].document_id, "doc-1");
//! ```

use serde::{Deserialize, Serialize};

use crate::Result;

/// Separators tried by default, from paragraph breaks down to words.
///
/// The single-character fallback is appended implicitly and never needs to
/// be listed.
pub const DEFAULT_SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A contiguous slice of a document's text
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Chunk {
    /// The text content of this chunk
    pub text: String,
    /// Character offset of the first character in the source document
    pub start_offset: usize,
    /// Source document identifier
    pub document_id: String,
    /// Position of this chunk among the document's chunks (0-indexed)
    pub sequence_index: usize,
}

impl Chunk {
    /// Length of the chunk in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Character offset one past the last character of this chunk.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.char_len()
    }
}

/// Trait for document chunking strategies
pub trait Chunker: Send + Sync {
    /// Split content into chunks
    ///
    /// # Arguments
    /// * `content` - The text content to chunk
    /// * `document_id` - Identifier stamped onto every produced chunk
    ///
    /// # Returns
    /// Chunks in left-to-right order with `sequence_index` 0..n-1
    fn chunk(&self, content: &str, document_id: &str) -> Vec<Chunk>;

    /// Returns the name of this chunking strategy
    fn name(&self) -> &str;
}

/// Split `text` with a one-off [`RecursiveChunker`].
///
/// Fails with [`Error::InvalidConfiguration`](crate::Error::InvalidConfiguration)
/// when `max_size == 0` or `overlap >= max_size`.
pub fn split<I, S>(
    text: &str,
    document_id: &str,
    max_size: usize,
    overlap: usize,
    separators: I,
) -> Result<Vec<Chunk>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let chunker = RecursiveChunker::new(max_size, overlap, separators)?;
    Ok(chunker.chunk(text, document_id))
}

mod recursive;

pub use recursive::*;
