//! Data types for documents, passages, and search results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Separator inserted between pages when a document is flattened for chunking.
pub const PAGE_SEPARATOR: char = '\n';

/// A loaded report: an ordered sequence of page texts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Where the document came from (usually a file path).
    pub source: String,
    /// Text of each page, in page order.
    pub pages: Vec<String>,
}

impl Document {
    /// Create a document from its source name and page texts.
    pub fn new(source: impl Into<String>, pages: Vec<String>) -> Self {
        Self { source: source.into(), pages }
    }

    /// The pages joined by [`PAGE_SEPARATOR`].
    pub fn full_text(&self) -> String {
        let mut text = String::with_capacity(self.pages.iter().map(String::len).sum::<usize>());
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                text.push(PAGE_SEPARATOR);
            }
            text.push_str(page);
        }
        text
    }

    /// Length of [`full_text`](Self::full_text) in characters.
    pub fn char_count(&self) -> usize {
        let chars: usize = self.pages.iter().map(|p| p.chars().count()).sum();
        chars + self.pages.len().saturating_sub(1)
    }

    /// Whether the document has no visible text at all.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }

    /// Character offset at which each page starts in the joined text.
    pub(crate) fn page_starts(&self) -> Vec<usize> {
        let mut starts = Vec::with_capacity(self.pages.len());
        let mut offset = 0;
        for page in &self.pages {
            starts.push(offset);
            offset += page.chars().count() + 1;
        }
        starts
    }
}

/// A contiguous span of a [`Document`], the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Passage {
    /// Position in the chunk sequence, starting at zero.
    pub sequence: usize,
    /// Index of the page on which the passage starts.
    pub page: usize,
    /// Start character offset (inclusive) in the joined document text.
    pub start: usize,
    /// End character offset (exclusive) in the joined document text.
    pub end: usize,
    /// The passage text.
    pub text: String,
}

impl Passage {
    /// Number of characters in the passage.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the passage spans no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// At most `max_chars` characters of the passage text.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }
}

/// A retrieved [`Passage`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved passage, shared with the index that owns it.
    pub passage: Arc<Passage>,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}
