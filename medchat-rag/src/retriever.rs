//! Retriever seam between the session and the vector index.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DEFAULT_TOP_K;
use crate::document::SearchResult;
use crate::error::Result;
use crate::index::VectorIndex;

/// Looks up the passages most relevant to a search query.
///
/// The session only depends on this trait, so an exact index can be swapped
/// for an approximate one without touching orchestration.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most the retriever's top-k passages, best first.
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// A [`Retriever`] over a [`VectorIndex`] with a fixed top-k.
#[derive(Debug, Clone)]
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    top_k: usize,
}

impl IndexRetriever {
    /// Retrieve [`DEFAULT_TOP_K`] passages per query.
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index, top_k: DEFAULT_TOP_K }
    }

    /// Set the number of passages returned per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// The number of passages returned per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.index.query(query, self.top_k).await
    }
}
