//! The interactive read loop.
//!
//! The shell reads one line at a time, answers commands itself, and hands everything else to the
//! session as a formatted turn.  It blocks in exactly two places: waiting for input, and inside
//! [`SessionController::submit`] while the engine streams its answer.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::chat::config::SessionConfig;
use crate::chat::session::SessionController;
use crate::chat::template::{PromptTemplate, TurnFormatter};
use crate::engine::Engine;
use crate::error::Result;
use crate::render::Renderer;

/// Prompt shown before every line of input.
pub const PROMPT: &str = ">> ";

/// What a single read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line of input, without its trailing newline.
    Line(String),
    /// The input stream is closed.
    Eof,
    /// The operator pressed Ctrl-C at the prompt.
    Interrupted,
}

/// A source of input lines.
pub trait LineReader {
    /// Reads one line, showing `prompt` first.
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Records a line in the reader's history, if it keeps one.
    fn add_history(&mut self, line: &str) {
        _ = line;
    }
}

/// A [`LineReader`] backed by rustyline.
pub struct EditorReader {
    editor: DefaultEditor,
}

impl EditorReader {
    /// Creates a reader attached to the terminal.
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(err) => Err(err.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// The operator typed an exit keyword or `/quit`.
    Quit,
    /// Input ended without an exit keyword.
    EndOfInput,
    /// The operator pressed Ctrl-C at the prompt.
    Interrupted,
}

/// The read-format-submit loop.
pub struct Shell<'a, E: Engine, T: PromptTemplate, R: Renderer + ?Sized> {
    controller: &'a SessionController<E>,
    formatter: TurnFormatter<T>,
    renderer: &'a R,
    config: &'a SessionConfig,
}

impl<'a, E: Engine, T: PromptTemplate, R: Renderer + ?Sized> Shell<'a, E, T, R> {
    /// Creates a shell over a started session.
    pub fn new(
        controller: &'a SessionController<E>,
        formatter: TurnFormatter<T>,
        renderer: &'a R,
        config: &'a SessionConfig,
    ) -> Self {
        Self {
            controller,
            formatter,
            renderer,
            config,
        }
    }

    /// Runs until the operator quits, input ends, or Ctrl-C is pressed at the prompt.
    ///
    /// A failed generation leaves only the sink's inline marker and the loop continues.  Any other
    /// error ends the loop and is returned; the caller is responsible for shutting the session
    /// down either way.
    pub fn run<L: LineReader + ?Sized>(&self, reader: &mut L) -> Result<ShellExit> {
        loop {
            let line = match reader.read_line(PROMPT)? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Eof => return Ok(ShellExit::EndOfInput),
                ReadOutcome::Interrupted => return Ok(ShellExit::Interrupted),
            };
            if line.trim().is_empty() {
                continue;
            }
            reader.add_history(&line);

            if let Some(cmd) = parse_command(&line) {
                match cmd {
                    ChatCommand::Quit => return Ok(ShellExit::Quit),
                    ChatCommand::Help => {
                        for line in help_text().lines() {
                            self.renderer.print_info(&format!("    {line}"));
                        }
                    }
                    ChatCommand::Stats => self.print_stats(),
                    ChatCommand::ShowConfig => {
                        for line in self.config.to_string().lines() {
                            self.renderer.print_info(&format!("    {line}"));
                        }
                    }
                    ChatCommand::Invalid(message) => self.renderer.print_error(&message),
                }
                continue;
            }

            let prompt = self.formatter.format(&line);
            match self.controller.submit(&prompt) {
                Ok(()) => {}
                // The sink has already shown the inline marker.
                Err(err) if err.is_generation() => {}
                Err(err) => return Err(err),
            }
        }
    }

    fn print_stats(&self) {
        let stats = self.controller.stats();
        self.renderer.print_info("    Session Statistics:");
        self.renderer
            .print_info(&format!("      State: {}", stats.state.as_str()));
        self.renderer
            .print_info(&format!("      Turns: {}", stats.turns));
        self.renderer.print_info(&format!(
            "      Failed generations: {}",
            stats.generation_failures
        ));
    }
}
