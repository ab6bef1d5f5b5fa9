//! Rewrites follow-up questions into standalone search queries.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::history::ConversationState;
use crate::llm::LanguageModel;

const CONDENSE_INSTRUCTION: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language. \
Keep any reference to the medical report, test names and values needed to search it.";

/// Turns a conversational question into a context-free query.
///
/// With empty history the question is returned unchanged and the model is
/// not called.
pub struct QueryCondenser {
    model: Arc<dyn LanguageModel>,
}

impl QueryCondenser {
    /// Create a condenser backed by `model`.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Build the condensation prompt for `question` given `history`.
    pub fn prompt(history: &ConversationState, question: &str) -> String {
        format!(
            "{CONDENSE_INSTRUCTION}\n\nChat History:\n{}\nFollow Up Input: {question}\nStandalone question:",
            history.transcript()
        )
    }

    /// Produce a standalone query for `question`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SynthesisError`] if the model call fails.
    pub async fn condense(&self, history: &ConversationState, question: &str) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = Self::prompt(history, question);
        let reply = self.model.generate(&prompt).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "query condensation failed");
            match e {
                RagError::SynthesisError { .. } => e,
                other => RagError::synthesis(self.model.name(), other.to_string()),
            }
        })?;

        let query = reply.trim();
        if query.is_empty() {
            debug!("model returned an empty standalone question, using the original");
            return Ok(question.to_string());
        }
        debug!(original = question, condensed = query, "condensed follow-up question");
        Ok(query.to_string())
    }
}
