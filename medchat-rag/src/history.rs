//! Conversation state: an append-only log of completed turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// The question as the user typed it.
    pub question: String,
    /// The standalone query used for retrieval.
    pub condensed_query: String,
    /// Sequence numbers of the passages given to the model.
    pub sources: Vec<usize>,
    /// The model's answer, verbatim.
    pub answer: String,
    /// When the question was asked.
    pub asked_at: DateTime<Utc>,
}

/// Chronological log of [`Turn`]s owned by a single session.
///
/// Turns can only be appended, or all dropped at once with [`clear`](Self::clear).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    /// An empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed turn.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Forget every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been recorded since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Recorded turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Render the conversation as `Human:` / `Assistant:` lines for a prompt.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Human: ");
            out.push_str(&turn.question);
            out.push_str("\nAssistant: ");
            out.push_str(&turn.answer);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(q: &str, a: &str) -> Turn {
        Turn {
            question: q.into(),
            condensed_query: q.into(),
            sources: vec![0],
            answer: a.into(),
            asked_at: Utc::now(),
        }
    }

    #[test]
    fn append_keeps_chronological_order() {
        let mut state = ConversationState::new();
        state.append(turn("first", "1"));
        state.append(turn("second", "2"));
        assert_eq!(state.len(), 2);
        assert_eq!(state.turns()[0].question, "first");
        assert_eq!(state.last().unwrap().question, "second");
    }

    #[test]
    fn clear_empties_history() {
        let mut state = ConversationState::new();
        state.append(turn("q", "a"));
        state.clear();
        assert!(state.is_empty());
        assert_eq!(state.transcript(), "");
    }

    #[test]
    fn transcript_format() {
        let mut state = ConversationState::new();
        state.append(turn("What is my LDL?", "Your LDL is 130 mg/dL."));
        state.append(turn("Is that high?", "It is borderline high."));
        assert_eq!(
            state.transcript(),
            "Human: What is my LDL?\nAssistant: Your LDL is 130 mg/dL.\n\
             Human: Is that high?\nAssistant: It is borderline high."
        );
    }
}
