//! The interactive question loop.

use std::future::Future;
use std::io::{self, Write};
use std::sync::mpsc as std_mpsc;
use std::thread;

use anyhow::anyhow;
use async_trait::async_trait;
use medchat_rag::{Reply, Session, TurnReply};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Prompt shown before each question.
pub const PROMPT: &str = "You: ";

/// One read from the input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A line of text, without its newline.
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D or end of piped input.
    Eof,
}

/// Where question lines come from.
#[async_trait]
pub trait LineSource: Send {
    /// Show `prompt` and wait for the next line, Ctrl-C or end of input.
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input>;
}

/// Line editing with in-memory history via `rustyline`.
///
/// The editor lives on its own thread, so waiting for the user never blocks
/// a runtime worker.
pub struct EditorInput {
    prompts: mpsc::Sender<String>,
    lines: mpsc::Receiver<anyhow::Result<Input>>,
}

impl EditorInput {
    /// Start the editor thread.
    ///
    /// # Errors
    ///
    /// Fails if the thread cannot be spawned or the terminal cannot be set up.
    pub fn new() -> anyhow::Result<Self> {
        let (prompt_tx, mut prompt_rx) = mpsc::channel::<String>(1);
        let (line_tx, line_rx) = mpsc::channel(1);
        let (ready_tx, ready_rx) = std_mpsc::channel::<anyhow::Result<()>>();

        thread::Builder::new().name("medchat-editor".into()).spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.into()));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            while let Some(prompt) = prompt_rx.blocking_recv() {
                let input = read_from(&mut editor, &prompt);
                if line_tx.blocking_send(input).is_err() {
                    break;
                }
            }
        })?;

        ready_rx.recv().map_err(|_| anyhow!("line editor thread exited during setup"))??;
        Ok(Self { prompts: prompt_tx, lines: line_rx })
    }
}

fn read_from(editor: &mut DefaultEditor, prompt: &str) -> anyhow::Result<Input> {
    match editor.readline(prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }
            Ok(Input::Line(line))
        }
        Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
        Err(ReadlineError::Eof) => Ok(Input::Eof),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl LineSource for EditorInput {
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Input> {
        self.prompts
            .send(prompt.to_string())
            .await
            .map_err(|_| anyhow!("line editor thread stopped"))?;
        self.lines.recv().await.unwrap_or_else(|| Err(anyhow!("line editor thread stopped")))
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
pub async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {}
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C, turns cannot be interrupted");
            std::future::pending::<()>().await;
        }
    }
}

/// Write the welcome banner.
pub fn render_banner(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "\nWelcome to the Medical Report Assistant!")?;
    writeln!(out, "Type 'exit' to end the conversation.")?;
    writeln!(out, "Type 'clear' to clear the conversation history.")?;
    writeln!(out, "{}", "-".repeat(50))
}

/// Write an answer followed by a numbered preview of every source passage.
pub fn render_reply(
    out: &mut impl Write,
    reply: &TurnReply,
    preview_chars: usize,
) -> io::Result<()> {
    writeln!(out, "\nAssistant: {}", reply.answer)?;
    if reply.sources.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nSources:")?;
    for (i, source) in reply.sources.iter().enumerate() {
        writeln!(out, "\nSource {}:", i + 1)?;
        writeln!(out, "{}...", source.passage.preview(preview_chars))?;
    }
    Ok(())
}

/// Drives a [`Session`] from a [`LineSource`], printing to `out`.
pub struct Console<W: Write> {
    out: W,
    preview_chars: usize,
}

impl<W: Write> Console<W> {
    /// Print to `out`, showing at most `preview_chars` of each source.
    pub fn new(out: W, preview_chars: usize) -> Self {
        Self { out, preview_chars }
    }

    /// Consume the console and return its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Run until `exit`, Ctrl-C or end of input. Turn errors are printed
    /// and the loop continues.
    pub async fn run(
        &mut self,
        session: &mut Session,
        input: &mut dyn LineSource,
    ) -> anyhow::Result<()> {
        self.run_until(session, input, ctrl_c).await
    }

    /// [`run`](Self::run) with a custom interrupt.
    ///
    /// `interrupt` is called once per question. If its future resolves
    /// while a turn is in flight, that turn is abandoned and the session
    /// ends; history keeps only completed turns.
    pub async fn run_until<F, Fut>(
        &mut self,
        session: &mut Session,
        input: &mut dyn LineSource,
        mut interrupt: F,
    ) -> anyhow::Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        render_banner(&mut self.out)?;

        loop {
            self.out.flush()?;
            let line = match input.read_line(&format!("\n{PROMPT}")).await? {
                Input::Line(line) => line,
                Input::Interrupted | Input::Eof => {
                    session.terminate();
                    writeln!(self.out, "\n\nExiting...")?;
                    return Ok(());
                }
            };

            let outcome = tokio::select! {
                outcome = session.handle(&line) => Some(outcome),
                () = interrupt() => None,
            };

            match outcome {
                Some(Ok(Reply::Answer(reply))) => {
                    render_reply(&mut self.out, &reply, self.preview_chars)?;
                }
                Some(Ok(Reply::Cleared)) => writeln!(self.out, "\nConversation history cleared.")?,
                Some(Ok(Reply::Exit)) => {
                    writeln!(
                        self.out,
                        "\nThank you for using the Medical Report Assistant. Goodbye!"
                    )?;
                    return Ok(());
                }
                Some(Ok(Reply::Ignored)) => debug!("blank input ignored"),
                Some(Err(e)) => {
                    warn!(error = %e, recoverable = e.is_recoverable(), "turn failed");
                    writeln!(self.out, "\nAn error occurred: {e}")?;
                }
                None => {
                    session.terminate();
                    writeln!(self.out, "\n\nExiting...")?;
                    return Ok(());
                }
            }
        }
    }
}
