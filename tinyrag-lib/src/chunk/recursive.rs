use std::collections::VecDeque;

use tracing::debug;

use crate::chunk::{Chunk, Chunker};
use crate::{Error, Result};

/// Recursive chunker - splits on the most preferred separator that occurs
///
/// Good for: prose, notes, anything with paragraph/line/sentence structure
///
/// Separators are tried in priority order. Segments produced by a separator
/// keep that separator at their end, so chunks are exact slices of the input.
/// Segments are packed greedily up to `max_size`; a segment that is too large
/// on its own is split again with the next separator. The last separator is
/// always the single-character fallback.
///
/// Overlap is best-effort: a new chunk re-includes whole trailing segments of
/// the previous one totalling at most `overlap` characters, which may be zero
/// when segment boundaries don't line up.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    max_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

/// Byte range into the source text plus its length in characters.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    chars: usize,
}

impl Span {
    fn of(text: &str, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            chars: text[start..end].chars().count(),
        }
    }
}

impl RecursiveChunker {
    /// Create a chunker.
    ///
    /// Empty strings in `separators` are dropped; the character fallback is
    /// always appended last.
    pub fn new<I, S>(max_size: usize, overlap: usize, separators: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if max_size == 0 {
            return Err(Error::InvalidConfiguration(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= max_size {
            return Err(Error::InvalidConfiguration(format!(
                "overlap ({overlap}) must be smaller than max_size ({max_size})"
            )));
        }

        let mut separators: Vec<String> = separators
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        separators.push(String::new());

        Ok(Self {
            max_size,
            overlap,
            separators,
        })
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Separators in priority order, ending with the empty character fallback.
    #[must_use]
    pub fn separators(&self) -> &[String] {
        &self.separators
    }

    fn split_span(&self, text: &str, span: Span, level: usize, out: &mut Vec<Span>) {
        let (level, segments) = self.segments(text, span, level);
        debug!(level, segments = segments.len(), "split span");

        let mut fitting = Vec::new();
        for segment in segments {
            if segment.chars <= self.max_size {
                fitting.push(segment);
                continue;
            }

            self.merge(&fitting, out);
            fitting.clear();

            // single characters always fit, so the fallback level never gets here
            self.split_span(text, segment, level + 1, out);
        }
        self.merge(&fitting, out);
    }

    /// Split `span` on the first separator at or after `from` that occurs in it.
    fn segments(&self, text: &str, span: Span, from: usize) -> (usize, Vec<Span>) {
        let slice = &text[span.start..span.end];
        let fallback = self.separators.len() - 1;
        let level = self.separators[from..]
            .iter()
            .position(|s| s.is_empty() || slice.contains(s.as_str()))
            .map_or(fallback, |i| from + i);

        let separator = self.separators[level].as_str();
        if separator.is_empty() {
            let chars = slice
                .char_indices()
                .map(|(i, c)| Span {
                    start: span.start + i,
                    end: span.start + i + c.len_utf8(),
                    chars: 1,
                })
                .collect();
            return (level, chars);
        }

        let mut segments = Vec::new();
        let mut cursor = span.start;
        for (i, _) in slice.match_indices(separator) {
            let end = span.start + i + separator.len();
            segments.push(Span::of(text, cursor, end));
            cursor = end;
        }
        if cursor < span.end {
            segments.push(Span::of(text, cursor, span.end));
        }
        (level, segments)
    }

    /// Greedily pack fitting segments into chunks, carrying trailing
    /// segments forward as overlap.
    fn merge(&self, segments: &[Span], out: &mut Vec<Span>) {
        let mut window: VecDeque<Span> = VecDeque::new();
        let mut total = 0;

        for &segment in segments {
            if total + segment.chars > self.max_size && !window.is_empty() {
                out.push(covering(&window, total));

                // back up by whole segments until within overlap and room for the next one
                while total > self.overlap || (total > 0 && total + segment.chars > self.max_size) {
                    let Some(dropped) = window.pop_front() else {
                        break;
                    };
                    total -= dropped.chars;
                }
            }
            window.push_back(segment);
            total += segment.chars;
        }

        if !window.is_empty() {
            out.push(covering(&window, total));
        }
    }
}

fn covering(window: &VecDeque<Span>, chars: usize) -> Span {
    match (window.front(), window.back()) {
        (Some(first), Some(last)) => Span {
            start: first.start,
            end: last.end,
            chars,
        },
        _ => Span {
            start: 0,
            end: 0,
            chars: 0,
        },
    }
}

impl Chunker for RecursiveChunker {
    fn name(&self) -> &str {
        "recursive"
    }

    fn chunk(&self, content: &str, document_id: &str) -> Vec<Chunk> {
        // whitespace-only documents carry no content
        if content.trim().is_empty() {
            return Vec::new();
        }

        let root = Span::of(content, 0, content.len());
        let mut spans = Vec::new();
        if root.chars <= self.max_size {
            spans.push(root);
        } else {
            self.split_span(content, root, 0, &mut spans);
        }
        debug!(document_id, chunks = spans.len(), "chunked document");

        // chunk starts never move backwards, so char offsets accumulate
        let mut byte_cursor = 0;
        let mut char_cursor = 0;
        spans
            .into_iter()
            .enumerate()
            .map(|(sequence_index, span)| {
                if span.start < byte_cursor {
                    byte_cursor = 0;
                    char_cursor = 0;
                }
                char_cursor += content[byte_cursor..span.start].chars().count();
                byte_cursor = span.start;

                Chunk {
                    text: content[span.start..span.end].to_string(),
                    start_offset: char_cursor,
                    document_id: document_id.to_string(),
                    sequence_index,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::DEFAULT_SEPARATORS;

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    /// Stitch chunks back together, skipping the overlapped prefix of each.
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for chunk in chunks {
            assert!(chunk.start_offset <= covered, "gap before chunk {}", chunk.sequence_index);
            let skip = covered - chunk.start_offset;
            out.extend(chunk.text.chars().skip(skip));
            covered = covered.max(chunk.end_offset());
        }
        out
    }

    const SAMPLE: &str = "This is a sample document for testing RAG.
    The weather is sunny today.
    Machine learning is an interesting field.
    Artificial intelligence is transforming many industries.

    RAG systems combine retrieval with generation.
    They help find relevant information efficiently.
    The key is to break documents into meaningful chunks.

    Data processing is a crucial step.
    Good text splitting improves search results.";

    #[test]
    fn test_rejects_zero_max_size() {
        let err = RecursiveChunker::new(0, 0, ["\n"]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_rejects_overlap_not_below_max_size() {
        assert!(matches!(
            RecursiveChunker::new(10, 10, ["\n"]),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            RecursiveChunker::new(10, 25, ["\n"]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_character_fallback_is_always_last() {
        let chunker = RecursiveChunker::new(10, 0, ["\n\n", "", "\n"]).unwrap();
        assert_eq!(chunker.separators(), &["\n\n", "\n", ""]);
    }

    #[test]
    fn test_empty_content() {
        let chunker = RecursiveChunker::new(10, 2, ["\n"]).unwrap();
        assert!(chunker.chunk("", "doc").is_empty());
    }

    #[test]
    fn test_whitespace_only() {
        let chunker = RecursiveChunker::new(10, 2, ["\n"]).unwrap();
        assert!(chunker.chunk("\n\n \t  \n", "doc").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = RecursiveChunker::new(100, 20, DEFAULT_SEPARATORS).unwrap();
        let chunks = chunker.chunk("Hello, world!", "doc");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].sequence_index, 0);
        assert_eq!(chunks[0].document_id, "doc");
    }

    #[test]
    fn test_two_sentences_split_on_period() {
        let text = format!("{}.{}", "a".repeat(40), "b".repeat(40));
        let chunker = RecursiveChunker::new(50, 10, ["\n\n", "\n", "."]).unwrap();
        let chunks = chunker.chunk(&text, "doc");

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.char_len() <= 50));

        let overlap = chunks[0].end_offset().saturating_sub(chunks[1].start_offset);
        assert!(overlap <= 10, "overlap was {overlap}");
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_overlap_backs_up_by_whole_segments() {
        let chunker = RecursiveChunker::new(20, 8, [" "]).unwrap();
        let chunks = chunker.chunk("one two three four five six seven eight", "doc");

        assert_eq!(
            texts(&chunks),
            vec!["one two three four ", "four five six seven ", "seven eight"]
        );
        assert_eq!(chunks[1].start_offset, 14);
        assert_eq!(chunks[2].start_offset, 28);
    }

    #[test]
    fn test_character_fallback_with_overlap() {
        let chunker = RecursiveChunker::new(10, 3, ["\n"]).unwrap();
        let chunks = chunker.chunk("abcdefghijklmnopqrstuvwxyz", "doc");

        assert_eq!(
            texts(&chunks),
            vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxyz"]
        );
        let offsets: Vec<_> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(offsets, vec![0, 7, 14, 21]);
    }

    #[test]
    fn test_oversized_segment_recurses_to_next_separator() {
        let chunker = RecursiveChunker::new(12, 0, ["\n\n", " "]).unwrap();
        let chunks = chunker.chunk("tiny\n\nthis paragraph is long", "doc");

        assert_eq!(
            texts(&chunks),
            vec!["tiny\n\n", "this ", "paragraph ", "is long"]
        );
        let offsets: Vec<_> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(offsets, vec![0, 6, 11, 21]);
    }

    #[test]
    fn test_sequence_indices_are_contiguous() {
        let chunker = RecursiveChunker::new(60, 15, DEFAULT_SEPARATORS).unwrap();
        let chunks = chunker.chunk(SAMPLE, "sample");

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i);
            assert_eq!(chunk.document_id, "sample");
        }
    }

    #[test]
    fn test_size_and_overlap_bounds_hold() {
        for (max_size, overlap) in [(100, 20), (40, 10), (25, 0), (7, 6)] {
            let chunker = RecursiveChunker::new(max_size, overlap, DEFAULT_SEPARATORS).unwrap();
            let chunks = chunker.chunk(SAMPLE, "sample");

            for pair in chunks.windows(2) {
                assert!(pair[0].start_offset <= pair[1].start_offset);
                let shared = pair[0].end_offset().saturating_sub(pair[1].start_offset);
                assert!(shared <= overlap, "overlap {shared} > {overlap}");
            }
            assert!(chunks.iter().all(|c| c.char_len() <= max_size));
        }
    }

    #[test]
    fn test_reconstructs_original_text() {
        for (max_size, overlap) in [(100, 20), (40, 10), (13, 5)] {
            let chunker = RecursiveChunker::new(max_size, overlap, DEFAULT_SEPARATORS).unwrap();
            let chunks = chunker.chunk(SAMPLE, "sample");
            assert_eq!(reconstruct(&chunks), SAMPLE);
        }
    }

    #[test]
    fn test_chunk_text_matches_offsets() {
        let chunker = RecursiveChunker::new(30, 10, DEFAULT_SEPARATORS).unwrap();
        let chunks = chunker.chunk(SAMPLE, "sample");
        let all: Vec<char> = SAMPLE.chars().collect();

        for chunk in &chunks {
            let expected: String = all[chunk.start_offset..chunk.end_offset()].iter().collect();
            assert_eq!(chunk.text, expected);
        }
    }

    #[test]
    fn test_unicode_offsets_count_characters() {
        let chunker = RecursiveChunker::new(6, 0, [" "]).unwrap();
        let chunks = chunker.chunk("ééééé ààààà üüüüü", "doc");

        assert_eq!(texts(&chunks), vec!["ééééé ", "ààààà ", "üüüüü"]);
        let offsets: Vec<_> = chunks.iter().map(|c| c.start_offset).collect();
        assert_eq!(offsets, vec![0, 6, 12]);
    }

    #[test]
    fn test_split_helper_validates() {
        assert!(crate::chunk::split("text", "doc", 0, 0, ["\n"]).is_err());
        let chunks = crate::chunk::split("text", "doc", 10, 2, ["\n"]).unwrap();
        assert_eq!(chunks.len(), 1);
    }
}
