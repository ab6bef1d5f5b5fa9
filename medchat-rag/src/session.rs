//! Session controller: one conversation over one indexed report.
//!
//! A turn runs condense → retrieve → synthesize → append strictly in order.
//! Conversation history changes only when a whole turn succeeds, so a failed
//! or abandoned turn leaves no trace.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::condenser::QueryCondenser;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::history::{ConversationState, Turn};
use crate::llm::LanguageModel;
use crate::retriever::Retriever;
use crate::synthesizer::AnswerSynthesizer;

/// Where the controller is in its turn loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ready, with no turn in flight: just created or just cleared.
    Idle,
    /// Waiting for the next line of input.
    AwaitingInput,
    /// Rewriting the question into a standalone query.
    Condensing,
    /// Looking up passages for the query.
    Retrieving,
    /// Waiting for the model's answer.
    Synthesizing,
    /// History was just discarded.
    Cleared,
    /// The session has ended; no further input is processed.
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingInput => "awaiting-input",
            SessionState::Condensing => "condensing",
            SessionState::Retrieving => "retrieving",
            SessionState::Synthesizing => "synthesizing",
            SessionState::Cleared => "cleared",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `exit`: end the session.
    Exit,
    /// `clear`: forget the conversation so far.
    Clear,
    /// Anything else that is not blank.
    Ask(String),
    /// A blank line.
    Empty,
}

impl Command {
    /// Parse one line. Commands are matched case-insensitively after trimming.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Command::Empty
        } else if line.eq_ignore_ascii_case("exit") {
            Command::Exit
        } else if line.eq_ignore_ascii_case("clear") {
            Command::Clear
        } else {
            Command::Ask(line.to_string())
        }
    }
}

/// The result of one successful turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    /// The question as asked.
    pub question: String,
    /// The standalone query used for retrieval.
    pub condensed_query: String,
    /// The model's answer.
    pub answer: String,
    /// Every passage given to the model, best first.
    pub sources: Vec<SearchResult>,
}

/// What [`Session::handle`] did with a line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A question was answered.
    Answer(TurnReply),
    /// History was cleared.
    Cleared,
    /// The session terminated.
    Exit,
    /// Blank input; nothing happened.
    Ignored,
}

/// Orchestrates turns and exclusively owns the [`ConversationState`].
pub struct Session {
    id: Uuid,
    retriever: Arc<dyn Retriever>,
    condenser: QueryCondenser,
    synthesizer: AnswerSynthesizer,
    history: ConversationState,
    state: SessionState,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("turns", &self.history.len())
            .finish()
    }
}

impl Session {
    /// Create a session that uses `model` for both condensation and synthesis.
    pub fn new(retriever: Arc<dyn Retriever>, model: Arc<dyn LanguageModel>) -> Self {
        Self::with_parts(
            retriever,
            QueryCondenser::new(Arc::clone(&model)),
            AnswerSynthesizer::new(model),
        )
    }

    /// Create a session from separately configured stages.
    pub fn with_parts(
        retriever: Arc<dyn Retriever>,
        condenser: QueryCondenser,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session.id = %id, "session created");
        Self {
            id,
            retriever,
            condenser,
            synthesizer,
            history: ConversationState::new(),
            state: SessionState::Idle,
        }
    }

    /// Identifier used to correlate log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state of the turn loop.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The conversation so far.
    pub fn history(&self) -> &ConversationState {
        &self.history
    }

    /// Process one line of input.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's error for a question whose turn failed;
    /// the session stays usable. Returns [`RagError::Interrupted`] once the
    /// session has terminated.
    pub async fn handle(&mut self, line: &str) -> Result<Reply> {
        if self.state == SessionState::Terminated {
            return Err(RagError::Interrupted);
        }
        match Command::parse(line) {
            Command::Exit => {
                self.terminate();
                Ok(Reply::Exit)
            }
            Command::Clear => {
                self.clear();
                Ok(Reply::Cleared)
            }
            Command::Empty => Ok(Reply::Ignored),
            Command::Ask(question) => self.ask(&question).await.map(Reply::Answer),
        }
    }

    /// Discard the conversation history. Makes no provider calls.
    pub fn clear(&mut self) {
        self.state = SessionState::Cleared;
        let dropped = self.history.len();
        self.history.clear();
        info!(session.id = %self.id, dropped_turns = dropped, "conversation cleared");
        self.state = SessionState::Idle;
    }

    /// End the session.
    pub fn terminate(&mut self) {
        info!(session.id = %self.id, turns = self.history.len(), "session terminated");
        self.state = SessionState::Terminated;
    }

    /// Run one full turn for `question`.
    ///
    /// Either the turn completes and is appended to history, or the error is
    /// returned and history is untouched. Dropping the returned future
    /// abandons the turn the same way and puts the session back in
    /// [`SessionState::AwaitingInput`].
    pub async fn ask(&mut self, question: &str) -> Result<TurnReply> {
        if self.state == SessionState::Terminated {
            return Err(RagError::Interrupted);
        }

        let span = info_span!("turn", session.id = %self.id, turn.index = self.history.len() + 1);
        let stage = StageGuard { state: &mut self.state };
        let outcome = run_turn(
            stage,
            &self.condenser,
            self.retriever.as_ref(),
            &self.synthesizer,
            &self.history,
            question,
        )
        .instrument(span)
        .await;

        match outcome {
            Ok((turn, reply)) => {
                self.history.append(turn);
                Ok(reply)
            }
            Err(e) => {
                warn!(session.id = %self.id, error = %e, "turn failed, history unchanged");
                Err(e)
            }
        }
    }
}

/// Tracks the in-flight stage and returns the session to
/// [`SessionState::AwaitingInput`] when dropped, whether the turn finished,
/// failed, or was abandoned mid-await.
struct StageGuard<'a> {
    state: &'a mut SessionState,
}

impl StageGuard<'_> {
    fn enter(&mut self, stage: SessionState) {
        *self.state = stage;
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        *self.state = SessionState::AwaitingInput;
    }
}

async fn run_turn(
    mut stage: StageGuard<'_>,
    condenser: &QueryCondenser,
    retriever: &dyn Retriever,
    synthesizer: &AnswerSynthesizer,
    history: &ConversationState,
    question: &str,
) -> Result<(Turn, TurnReply)> {
    let asked_at = Utc::now();

    stage.enter(SessionState::Condensing);
    let condensed_query = condenser.condense(history, question).await?;

    stage.enter(SessionState::Retrieving);
    let sources = retriever.retrieve(&condensed_query).await?;
    debug!(result_count = sources.len(), "retrieved passages");

    stage.enter(SessionState::Synthesizing);
    let answer = synthesizer.synthesize(question, sources, history).await?;

    let turn = Turn {
        question: question.to_string(),
        condensed_query: condensed_query.clone(),
        sources: answer.cited.iter().map(|r| r.passage.sequence).collect(),
        answer: answer.text.clone(),
        asked_at,
    };
    let reply = TurnReply {
        question: question.to_string(),
        condensed_query,
        answer: answer.text,
        sources: answer.cited,
    };
    info!(sources = reply.sources.len(), "turn completed");
    Ok((turn, reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("exit"), Command::Exit);
        assert_eq!(Command::parse("  EXIT \n"), Command::Exit);
        assert_eq!(Command::parse("Clear"), Command::Clear);
        assert_eq!(Command::parse("   "), Command::Empty);
        assert_eq!(
            Command::parse(" What is my cholesterol level? "),
            Command::Ask("What is my cholesterol level?".into())
        );
        assert_eq!(Command::parse("exit now"), Command::Ask("exit now".into()));
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::AwaitingInput.to_string(), "awaiting-input");
        assert_eq!(SessionState::Terminated.to_string(), "terminated");
    }
}
