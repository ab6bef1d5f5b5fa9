//! Property tests for vector index correspondence and ranking.

use std::sync::Arc;

use async_trait::async_trait;
use medchat_rag::document::Passage;
use medchat_rag::embedding::EmbeddingProvider;
use medchat_rag::error::{RagError, Result};
use medchat_rag::index::VectorIndex;
use medchat_rag::mock::HashEmbeddingProvider;
use proptest::prelude::*;

fn passages(texts: &[String]) -> Vec<Passage> {
    let mut offset = 0;
    texts
        .iter()
        .enumerate()
        .map(|(sequence, text)| {
            let len = text.chars().count();
            let passage =
                Passage { sequence, page: 0, start: offset, end: offset + len, text: text.clone() };
            offset += len;
            passage
        })
        .collect()
}

fn arb_texts() -> impl Strategy<Value = Vec<String>> {
    let word = "(ldl|hdl|glucose|iron|sodium|normal|high|low)( [a-z]{2,6}){0,6}";
    proptest::collection::vec(word, 1..20)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

/// **Index correspondence and ranking**
/// *For any* set of passages, the built index holds exactly one embedding per
/// passage; a query returns at most `k` results, all taken from the index,
/// ordered by descending score with ties in chunk order, and repeating the
/// query yields the same ranking.
mod prop_index_ranking {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_bounded_and_stable(
            texts in arb_texts(),
            query in "(ldl|glucose|sodium|high)( [a-z]{2,6}){0,3}",
            k in 1usize..25,
        ) {
            let (index, first, second) = runtime().block_on(async {
                let embedder = Arc::new(HashEmbeddingProvider::new(16));
                let index = VectorIndex::build(passages(&texts), embedder).await.unwrap();
                let first = index.query(&query, k).await.unwrap();
                let second = index.query(&query, k).await.unwrap();
                (index, first, second)
            });

            prop_assert_eq!(index.len(), texts.len());
            prop_assert_eq!(index.embedding_count(), texts.len());

            prop_assert!(first.len() <= k);
            prop_assert_eq!(first.len(), k.min(texts.len()));

            for result in &first {
                let indexed = &index.passages()[result.passage.sequence];
                prop_assert_eq!(indexed.as_ref(), result.passage.as_ref());
            }

            for window in first.windows(2) {
                prop_assert!(
                    window[0].score > window[1].score
                        || (window[0].score == window[1].score
                            && window[0].passage.sequence < window[1].passage.sequence),
                    "bad order: ({}, {}) then ({}, {})",
                    window[0].score,
                    window[0].passage.sequence,
                    window[1].score,
                    window[1].passage.sequence,
                );
            }

            prop_assert_eq!(first, second);
        }
    }
}

struct ShortBatchProvider;

#[async_trait]
impl EmbeddingProvider for ShortBatchProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0, 0.0]; texts.len().saturating_sub(1)])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Embeds passages in three dimensions but queries in one.
struct ShortQueryProvider;

#[async_trait]
impl EmbeddingProvider for ShortQueryProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0])
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().enumerate().map(|(i, _)| vec![1.0, i as f32, 0.0]).collect())
    }

    fn dimensions(&self) -> usize {
        3
    }
}

#[tokio::test]
async fn query_rejects_embedding_of_wrong_dimension() {
    let texts = vec!["ldl".to_string(), "hdl".to_string()];
    let index = VectorIndex::build(passages(&texts), Arc::new(ShortQueryProvider)).await.unwrap();
    assert_eq!(index.dimensions(), 3);

    let err = index.query("cholesterol", 2).await.unwrap_err();
    let RagError::EmbeddingError { message, .. } = err else {
        panic!("expected EmbeddingError, got {err:?}");
    };
    assert!(message.contains("dimension 1"), "{message}");
    assert!(message.contains("index has 3"), "{message}");
}

#[tokio::test]
async fn build_fails_when_provider_fails() {
    let embedder = Arc::new(HashEmbeddingProvider::new(8));
    embedder.set_failing(true);
    let err = VectorIndex::build(passages(&["ldl 130".into()]), embedder).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
}

#[tokio::test]
async fn build_rejects_missing_embeddings() {
    let texts = vec!["ldl".to_string(), "hdl".to_string()];
    let err = VectorIndex::build(passages(&texts), Arc::new(ShortBatchProvider)).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingError { .. }));
}

#[tokio::test]
async fn equal_scores_keep_chunk_order() {
    let texts: Vec<String> = vec!["same".into(), "same".into(), "same".into()];
    let index = VectorIndex::build(passages(&texts), Arc::new(HashEmbeddingProvider::new(8)))
        .await
        .unwrap();
    let results = index.query("same", 2).await.unwrap();
    let order: Vec<usize> = results.iter().map(|r| r.passage.sequence).collect();
    assert_eq!(order, vec![0, 1]);
}

#[tokio::test]
async fn most_similar_passage_ranks_first() {
    let texts: Vec<String> = vec![
        "Sodium 140 mmol/L normal".into(),
        "Total cholesterol 240 mg/dL high".into(),
        "Glucose fasting 92 mg/dL".into(),
    ];
    let index = VectorIndex::build(passages(&texts), Arc::new(HashEmbeddingProvider::new(64)))
        .await
        .unwrap();
    let results = index.query_default("What is my cholesterol level?").await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].passage.sequence, 1);
}

#[tokio::test]
async fn query_fails_when_provider_fails() {
    let embedder = Arc::new(HashEmbeddingProvider::new(8));
    let index = VectorIndex::build(passages(&["ldl".into()]), embedder.clone()).await.unwrap();
    embedder.set_failing(true);
    assert!(matches!(index.query("ldl", 4).await, Err(RagError::EmbeddingError { .. })));
}
