//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], a
//! sliding character window with configurable overlap.

use tracing::debug;

use crate::config::validate_chunking;
use crate::document::{Document, Passage};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into passages.
///
/// Implementations are pure: the same document always yields the same
/// passages, numbered from zero in document order.
pub trait Chunker: Send + Sync {
    /// Split a document into passages.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyDocument`] if the document has no text to split.
    fn split(&self, document: &Document) -> Result<Vec<Passage>>;
}

/// Splits text into fixed-size passages by character count with configurable overlap.
///
/// The pages of the document are joined with
/// [`PAGE_SEPARATOR`](crate::document::PAGE_SEPARATOR), then a window of
/// `chunk_size` characters advances by `chunk_size - chunk_overlap`. The last
/// window may be shorter. Counting is by `char`, so a multi-byte character is
/// never cut in half.
///
/// # Example
///
/// ```rust,ignore
/// use medchat_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(1000, 20)?;
/// let passages = chunker.split(&document)?;
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per passage
    /// * `chunk_overlap` — number of characters shared by consecutive passages
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] unless
    /// `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum number of characters per passage.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive passages.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, document: &Document) -> Result<Vec<Passage>> {
        if document.is_blank() {
            return Err(RagError::EmptyDocument(format!(
                "'{}' contains no extractable text",
                document.source
            )));
        }

        let text = document.full_text();
        // Byte offset of every char, plus the end of the string.
        let bounds: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let char_count = bounds.len() - 1;
        let page_starts = document.page_starts();
        let step = self.chunk_size - self.chunk_overlap;

        let mut passages = Vec::new();
        let mut start = 0;
        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            let page = page_starts.partition_point(|&s| s <= start).saturating_sub(1);

            passages.push(Passage {
                sequence: passages.len(),
                page,
                start,
                end,
                text: text[bounds[start]..bounds[end]].to_string(),
            });

            if end == char_count {
                break;
            }
            start += step;
        }

        debug!(
            source = %document.source,
            char_count,
            passage_count = passages.len(),
            "split document"
        );

        if passages.is_empty() {
            return Err(RagError::EmptyDocument(format!(
                "'{}' produced no passages",
                document.source
            )));
        }
        Ok(passages)
    }
}
