//! Error types for the `medchat-rag` crate.

use thiserror::Error;

/// Errors that can occur while building or running a report session.
#[derive(Debug, Error)]
pub enum RagError {
    /// One or more required settings (usually provider credentials) are absent.
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// Chunking or retrieval parameters are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The document path does not exist or cannot be read.
    #[error("Source not found: {path}")]
    SourceNotFound {
        /// The path that was requested.
        path: String,
    },

    /// The document produced no text to index.
    #[error("Empty document: {0}")]
    EmptyDocument(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model failed to produce a response.
    #[error("Synthesis error ({provider}): {message}")]
    SynthesisError {
        /// The language model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The user asked to stop the session.
    #[error("Interrupted by user")]
    Interrupted,
}

impl RagError {
    /// Whether the session may continue after this error.
    ///
    /// Provider failures only abandon the current turn. Everything else
    /// happens before a session exists, or ends it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RagError::EmbeddingError { .. } | RagError::SynthesisError { .. })
    }

    pub(crate) fn embedding(provider: &str, message: impl Into<String>) -> Self {
        RagError::EmbeddingError { provider: provider.to_string(), message: message.into() }
    }

    pub(crate) fn synthesis(provider: &str, message: impl Into<String>) -> Self {
        RagError::SynthesisError { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
