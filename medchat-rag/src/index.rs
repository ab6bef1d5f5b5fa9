//! In-memory vector index using exact cosine similarity.
//!
//! [`VectorIndex`] owns every passage of one document together with its
//! embedding. It is built once, all-or-nothing, and is read-only afterwards.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::DEFAULT_TOP_K;
use crate::document::{Passage, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// An immutable collection of (passage, embedding) pairs.
///
/// `passages[i]` is always embedded by `vectors[i]`.
///
/// # Example
///
/// ```rust,ignore
/// use medchat_rag::VectorIndex;
///
/// let index = VectorIndex::build(passages, embedder).await?;
/// let results = index.query("LDL cholesterol", 4).await?;
/// ```
pub struct VectorIndex {
    passages: Vec<Arc<Passage>>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("len", &self.passages.len())
            .field("dimensions", &self.dimensions)
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex {
    /// Embed every passage and build the index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails, returns the
    /// wrong number of vectors, or returns vectors of differing dimension. No
    /// index is produced in that case.
    pub async fn build(
        passages: Vec<Passage>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        if passages.is_empty() {
            return Err(RagError::EmptyDocument("no passages to index".to_string()));
        }

        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let vectors = embedder.embed_batch(&texts).await.map_err(|e| {
            error!(provider = embedder.name(), error = %e, "embedding failed during index build");
            match e {
                RagError::EmbeddingError { .. } => e,
                other => RagError::embedding(embedder.name(), other.to_string()),
            }
        })?;

        if vectors.len() != passages.len() {
            return Err(RagError::embedding(
                embedder.name(),
                format!("expected {} embeddings, got {}", passages.len(), vectors.len()),
            ));
        }
        let dimensions = vectors[0].len();
        if dimensions == 0 || vectors.iter().any(|v| v.len() != dimensions) {
            return Err(RagError::embedding(
                embedder.name(),
                "provider returned embeddings of inconsistent dimension",
            ));
        }

        info!(passage_count = passages.len(), dimensions, "built vector index");

        Ok(Self {
            passages: passages.into_iter().map(Arc::new).collect(),
            vectors,
            dimensions,
            embedder,
        })
    }

    /// Number of indexed passages (equal to the number of embeddings).
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the index holds no passages. Never true for a built index.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Number of stored embeddings.
    pub fn embedding_count(&self) -> usize {
        self.vectors.len()
    }

    /// Length of every stored embedding.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The indexed passages in chunk order.
    pub fn passages(&self) -> &[Arc<Passage>] {
        &self.passages
    }

    /// Embed `text` and return the `k` most similar passages.
    ///
    /// Results are ordered by descending score; equal scores keep chunk order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails or returns
    /// a vector whose length differs from the indexed embeddings.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(text).await.map_err(|e| {
            error!(provider = self.embedder.name(), error = %e, "query embedding failed");
            match e {
                RagError::EmbeddingError { .. } => e,
                other => RagError::embedding(self.embedder.name(), other.to_string()),
            }
        })?;
        if embedding.len() != self.dimensions {
            error!(
                provider = self.embedder.name(),
                got = embedding.len(),
                expected = self.dimensions,
                "query embedding dimension mismatch"
            );
            return Err(RagError::embedding(
                self.embedder.name(),
                format!(
                    "query embedding has dimension {}, index has {}",
                    embedding.len(),
                    self.dimensions
                ),
            ));
        }
        Ok(self.search(&embedding, k))
    }

    /// [`query`](Self::query) with [`DEFAULT_TOP_K`].
    pub async fn query_default(&self, text: &str) -> Result<Vec<SearchResult>> {
        self.query(text, DEFAULT_TOP_K).await
    }

    /// Rank all passages against an already computed query embedding.
    ///
    /// `embedding` must have [`dimensions`](Self::dimensions) entries;
    /// [`query`](Self::query) checks this before searching.
    pub fn search(&self, embedding: &[f32], k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let score = cosine_similarity(v, embedding);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        // Stable sort: ties keep ascending sequence order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        debug!(k, result_count = scored.len(), "vector search");

        scored
            .into_iter()
            .map(|(i, score)| SearchResult { passage: Arc::clone(&self.passages[i]), score })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
