//! # medchat-rag
//!
//! Conversational question answering over a single medical report.
//!
//! ## Overview
//!
//! A report is loaded, split into overlapping passages and embedded into an
//! in-memory [`VectorIndex`]. Each question then runs one turn:
//!
//! 1. [`QueryCondenser`] rewrites follow-ups into a standalone query
//! 2. a [`Retriever`] returns the top-k most similar passages
//! 3. [`AnswerSynthesizer`] asks the [`LanguageModel`] for a grounded answer
//! 4. the [`Session`] appends the completed turn to its history
//!
//! The synthesizer's fixed instruction forbids medical advice, diagnosis and
//! treatment; see [`synthesizer::SYSTEM_INSTRUCTION`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use medchat_rag::{RagConfig, RagPipeline, loader_for_path};
//! use medchat_rag::gemini::GeminiModel;
//! use medchat_rag::openai::OpenAIEmbeddingProvider;
//!
//! let document = loader_for_path(path).load(path).await?;
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(OpenAIEmbeddingProvider::new(openai_key)?))
//!     .language_model(Arc::new(GeminiModel::new(google_key, "gemini-2.0-flash")?))
//!     .build()?;
//!
//! let mut session = pipeline.open_session(&document).await?;
//! let reply = session.ask("What is my cholesterol level?").await?;
//! println!("{}", reply.answer);
//! ```
//!
//! ## Features
//!
//! - `openai` (default): [`openai::OpenAIEmbeddingProvider`]
//! - `gemini` (default): [`gemini::GeminiModel`]
//! - `mock`: deterministic providers in `mock` for tests

pub mod chunking;
pub mod condenser;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod history;
pub mod index;
pub mod llm;
pub mod loader;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod retriever;
pub mod retry;
pub mod session;
pub mod synthesizer;

pub use chunking::{Chunker, FixedSizeChunker};
pub use condenser::QueryCondenser;
pub use config::{DEFAULT_TOP_K, RagConfig, RagConfigBuilder};
pub use document::{Document, Passage, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
#[cfg(feature = "gemini")]
pub use gemini::GeminiModel;
pub use history::{ConversationState, Turn};
pub use index::VectorIndex;
pub use llm::LanguageModel;
pub use loader::{DocumentLoader, PdfLoader, TextLoader, loader_for_path};
#[cfg(any(test, feature = "mock"))]
pub use mock::{FailingEmbeddingProvider, HashEmbeddingProvider, MockLanguageModel};
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use retriever::{IndexRetriever, Retriever};
pub use retry::RetryPolicy;
pub use session::{Command, Reply, Session, SessionState, TurnReply};
pub use synthesizer::{Answer, AnswerSynthesizer, DISCLAIMER};
