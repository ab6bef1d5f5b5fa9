//! RAG pipeline: turns a loaded document into a ready session.
//!
//! The [`RagPipeline`] composes an [`EmbeddingProvider`], a [`LanguageModel`]
//! and a [`Chunker`], and performs the one-time chunk → embed → index build
//! before any question is accepted.
//!
//! # Example
//!
//! ```rust,ignore
//! use medchat_rag::{RagPipeline, RagConfig};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .language_model(Arc::new(my_model))
//!     .build()?;
//!
//! let mut session = pipeline.open_session(&document).await?;
//! let reply = session.ask("What is my cholesterol level?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::llm::LanguageModel;
use crate::retriever::IndexRetriever;
use crate::session::Session;

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    language_model: Arc<dyn LanguageModel>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the language model.
    pub fn language_model(&self) -> &Arc<dyn LanguageModel> {
        &self.language_model
    }

    /// Chunk and embed `document` into a new index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyDocument`] if the document yields no passages,
    /// or [`RagError::EmbeddingError`] if any embedding fails.
    pub async fn build_index(&self, document: &Document) -> Result<VectorIndex> {
        let passages = self.chunker.split(document).map_err(|e| {
            error!(source = %document.source, error = %e, "chunking failed");
            e
        })?;
        let passage_count = passages.len();

        let index = VectorIndex::build(passages, Arc::clone(&self.embedding_provider)).await?;

        info!(
            source = %document.source,
            pages = document.pages.len(),
            passage_count,
            "indexed document"
        );
        Ok(index)
    }

    /// Index `document` and open a conversation over it.
    pub async fn open_session(&self, document: &Document) -> Result<Session> {
        let index = Arc::new(self.build_index(document).await?);
        let retriever = IndexRetriever::new(index).with_top_k(self.config.top_k);
        Ok(Session::new(Arc::new(retriever), Arc::clone(&self.language_model)))
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The embedding provider and language model are required. Without an
/// explicit chunker, a [`FixedSizeChunker`] is built from the config.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    language_model: Option<Arc<dyn LanguageModel>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the language model used to condense questions and write answers.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Replace the default document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::MissingConfiguration`] if a provider is missing and
    /// [`RagError::InvalidConfiguration`] if the config is inconsistent.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::MissingConfiguration("embedding_provider is required".to_string())
        })?;
        let language_model = self.language_model.ok_or_else(|| {
            RagError::MissingConfiguration("language_model is required".to_string())
        })?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        Ok(RagPipeline { config, embedding_provider, language_model, chunker })
    }
}
