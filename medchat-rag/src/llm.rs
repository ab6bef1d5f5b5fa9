//! Language model trait used for query condensation and answer synthesis.

use async_trait::async_trait;

use crate::error::Result;

/// A text-in, text-out language model.
///
/// Implementations must report failures (transport errors, refusals with no
/// candidates, timeouts) as [`RagError::SynthesisError`](crate::RagError::SynthesisError).
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// The model identifier, e.g. `gemini-2.0-flash`.
    fn name(&self) -> &str;

    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
