//! Grounded answer synthesis.
//!
//! The prompt always starts with [`SYSTEM_INSTRUCTION`], which fixes the
//! assistant's persona and forbids medical advice, diagnosis and treatment
//! recommendations. Callers cannot override it.

use std::sync::Arc;

use tracing::{error, info};

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::history::ConversationState;
use crate::llm::LanguageModel;

/// The sentence every prompt carries to disclaim medical authority.
pub const DISCLAIMER: &str = "Please remember, I'm an AI and cannot offer medical advice, \
diagnoses, or treatment. Always consult your doctor for any health concerns.";

/// Fixed persona and scope-of-practice instruction prefixed to every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are designed to explain medical reports in simple \
terms. I can break down complex medical jargon and clarify findings from your reports. \
Please remember, I'm an AI and cannot offer medical advice, diagnoses, or treatment. \
Always consult your doctor for any health concerns. \
Answer only from the report context below; if the context does not contain the answer, say so. \
Never recommend medication, dosage or treatment, and end every answer by reminding the reader \
to consult their doctor.";

/// An answer together with every passage that was supplied as context.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// The model's response, verbatim.
    pub text: String,
    /// The passages given to the model, in retrieval order.
    pub cited: Vec<SearchResult>,
}

/// Builds the grounding prompt and calls the language model once.
pub struct AnswerSynthesizer {
    model: Arc<dyn LanguageModel>,
}

impl AnswerSynthesizer {
    /// Create a synthesizer backed by `model`.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Assemble the full prompt: instruction, history, context, question.
    pub fn prompt(
        question: &str,
        passages: &[SearchResult],
        history: &ConversationState,
    ) -> String {
        let context = passages
            .iter()
            .map(|r| r.passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "{SYSTEM_INSTRUCTION}\n\nChat History:\n{}\n\nContext:\n{context}\n\nHuman: {question}\nAssistant: ",
            history.transcript()
        )
    }

    /// Answer `question` from `passages`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SynthesisError`] if the model call fails. The call
    /// is not retried here.
    pub async fn synthesize(
        &self,
        question: &str,
        passages: Vec<SearchResult>,
        history: &ConversationState,
    ) -> Result<Answer> {
        let prompt = Self::prompt(question, &passages, history);
        let text = self.model.generate(&prompt).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "answer synthesis failed");
            match e {
                RagError::SynthesisError { .. } => e,
                other => RagError::synthesis(self.model.name(), other.to_string()),
            }
        })?;

        info!(
            model = self.model.name(),
            context_passages = passages.len(),
            answer_len = text.len(),
            "synthesized answer"
        );

        Ok(Answer { text, cited: passages })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::document::Passage;
    use crate::history::Turn;

    fn result(seq: usize, text: &str) -> SearchResult {
        SearchResult {
            passage: Arc::new(Passage {
                sequence: seq,
                page: 0,
                start: 0,
                end: text.chars().count(),
                text: text.into(),
            }),
            score: 0.9,
        }
    }

    #[test]
    fn instruction_contains_disclaimer() {
        assert!(SYSTEM_INSTRUCTION.contains(DISCLAIMER));
    }

    #[test]
    fn prompt_orders_sections() {
        let mut history = ConversationState::new();
        history.append(Turn {
            question: "What is HDL?".into(),
            condensed_query: "What is HDL?".into(),
            sources: vec![],
            answer: "Good cholesterol.".into(),
            asked_at: Utc::now(),
        });
        let passages = vec![result(0, "LDL 130 mg/dL"), result(3, "HDL 55 mg/dL")];
        let prompt = AnswerSynthesizer::prompt("Is my LDL high?", &passages, &history);

        assert!(prompt.starts_with(SYSTEM_INSTRUCTION));
        let history_at = prompt.find("Chat History:\nHuman: What is HDL?").unwrap();
        let context_at = prompt.find("Context:\nLDL 130 mg/dL\n\nHDL 55 mg/dL").unwrap();
        let question_at = prompt.find("Human: Is my LDL high?\nAssistant: ").unwrap();
        assert!(history_at < context_at && context_at < question_at);
    }
}
