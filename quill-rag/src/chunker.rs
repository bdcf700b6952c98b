//! Boundary-aware text chunking.
//!
//! Splits extracted document text into overlapping fixed-size spans,
//! preferring to cut on whitespace or sentence punctuation so words are
//! not split mid-token.

use crate::error::{RagError, Result};

/// Characters the window edge may land on without forcing a backward walk.
fn is_natural_boundary(c: char) -> bool {
    matches!(c, ' ' | '\n' | '.' | '!' | '?')
}

/// Splits text into overlapping chunks by character count.
///
/// Consecutive chunks re-include the final `chunk_overlap` characters of
/// their predecessor so context is not lost at arbitrary split points.
/// Offsets are counted in characters, never bytes, so multi-byte UTF-8
/// is never split.
///
/// # Example
///
/// ```rust,ignore
/// use quill_rag::TextChunker;
///
/// let chunker = TextChunker::new(512, 50)?;
/// let chunks = chunker.chunk(&text);
/// ```
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a new `TextChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_overlap >= chunk_size`;
    /// an invalid pair fails here, not at chunk time.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters of source text repeated between consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered, non-empty, whitespace-trimmed chunks.
    ///
    /// Each window takes up to `chunk_size` characters. If the window edge
    /// falls strictly inside the text and not on a natural boundary, the
    /// cut moves back to the last space inside the window; with no space
    /// available the mid-word cut is accepted. The next window starts
    /// `chunk_overlap` characters before the previous end, with forward
    /// progress forced unconditionally so the loop always terminates.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let mut end = (start + self.chunk_size).min(total);

            if end < total && !is_natural_boundary(chars[end]) {
                if let Some(pos) = chars[start..end].iter().rposition(|c| *c == ' ') {
                    end = start + pos;
                }
            }

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            if end >= total {
                break;
            }
            let next = end.saturating_sub(self.chunk_overlap);
            start = if next > start { next } else { start + 1 };
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(matches!(TextChunker::new(100, 100), Err(RagError::Config(_))));
        assert!(matches!(TextChunker::new(100, 150), Err(RagError::Config(_))));
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn short_text_yields_single_trimmed_chunk() {
        let chunker = TextChunker::new(100, 20).unwrap();
        assert_eq!(chunker.chunk("  hello world  "), vec!["hello world"]);
    }

    #[test]
    fn empty_and_whitespace_text_yield_no_chunks() {
        let chunker = TextChunker::new(100, 20).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t  ").is_empty());
    }

    #[test]
    fn never_splits_words_when_a_space_is_available() {
        let text = "Word ".repeat(50); // 250 characters
        let chunker = TextChunker::new(100, 20).unwrap();
        let chunks = chunker.chunk(&text);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "chunk too long: {chunk:?}");
            assert!(!chunk.is_empty());
            for word in chunk.split_whitespace() {
                assert_eq!(word, "Word", "word split across a boundary in {chunk:?}");
            }
        }
    }

    #[test]
    fn accepts_mid_word_split_when_no_space_exists() {
        let text = "a".repeat(250);
        let chunker = TextChunker::new(100, 20).unwrap();
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 90);
        let recovered: usize = chunks.iter().map(String::len).sum();
        // Each chunk after the first repeats 20 characters of its predecessor.
        assert_eq!(recovered, 250 + 2 * 20);
    }

    #[test]
    fn covers_every_word_of_the_source() {
        let words: Vec<String> = (0..40).map(|i| format!("word{i}")).collect();
        let text = words.join(" ");
        let chunker = TextChunker::new(64, 16).unwrap();
        let chunks = chunker.chunk(&text);

        let all = chunks.join(" ");
        for word in &words {
            assert!(all.contains(word.as_str()), "missing {word}");
        }
    }

    #[test]
    fn terminates_on_pathological_overlap() {
        // Overlap one below chunk_size forces the single-character advance path.
        let text = "x".repeat(64);
        let chunker = TextChunker::new(8, 7).unwrap();
        let chunks = chunker.chunk(&text);
        assert!(!chunks.is_empty());
        // Worst case advances one character per iteration.
        assert!(chunks.len() <= 64);
    }

    #[test]
    fn handles_multibyte_text_without_panicking() {
        let text = "héllo wörld ü ".repeat(30);
        let chunker = TextChunker::new(50, 10).unwrap();
        let chunks = chunker.chunk(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }
    }

    #[test]
    fn chunks_preserve_source_order() {
        let text = (0..30).map(|i| format!("tok{i:02}")).collect::<Vec<_>>().join(" ");
        let chunker = TextChunker::new(40, 10).unwrap();
        let chunks = chunker.chunk(&text);

        // The first token of each successive chunk never moves backwards.
        let firsts: Vec<&str> =
            chunks.iter().filter_map(|c| c.split_whitespace().next()).collect();
        let mut indices = Vec::new();
        for first in firsts {
            let trimmed = first.trim_start_matches("tok");
            if let Ok(n) = trimmed.parse::<usize>() {
                indices.push(n);
            }
        }
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
    }
}
