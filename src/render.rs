//! Output rendering for streamed generations.
//!
//! The renderer is the event sink handed to the engine.  Chunks are written and flushed as soon
//! as they arrive; the end of a turn gets a single newline; an engine error gets an inline marker
//! and nothing else, so the shell can go straight back to the prompt.

use std::io::{self, Stdout, Write};
use std::sync::{Mutex, MutexGuard};

use crate::engine::{EventSink, GenerationEvent};
use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};

/// ANSI escape code for red text (used for error markers).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// Marker written inline when the engine reports an error mid-turn.
pub const GENERATION_ERROR_MARKER: &str = "[LLM run error]";

/// Trait for rendering chat output.
///
/// Methods take `&self` because the engine may deliver events from its own threads while the
/// shell holds a reference to the same renderer.
pub trait Renderer: EventSink {
    /// Print a chunk of generated text.
    ///
    /// This is called incrementally as the engine streams tokens.  The bytes are written as
    /// they are; a character split across two chunks is whole once both have been written.
    fn print_text(&self, text: &[u8]);

    /// Called when a turn is complete.
    fn finish_response(&self);

    /// Print the inline marker for an engine error.
    fn print_generation_error(&self);

    /// Print an error message.
    fn print_error(&self, error: &str);

    /// Print an informational message.
    fn print_info(&self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer writes directly to its output (stdout by default) and flushes after every
/// write so that streamed tokens show up immediately.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: Mutex<W>,
    use_color: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            use_color,
        }
    }

    /// Returns whether ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Consumes the renderer and returns its writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn out(&self) -> MutexGuard<'_, W> {
        self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_flushed(&self, bytes: &[u8]) {
        let mut out = self.out();
        let _ = out.write_all(bytes);
        let _ = out.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_text(&self, text: &[u8]) {
        STREAM_CHUNKS.click();
        STREAM_BYTES.count(text.len() as u64);
        self.write_flushed(text);
    }

    fn finish_response(&self) {
        self.write_flushed(b"\n");
    }

    fn print_generation_error(&self) {
        STREAM_ERRORS.click();
        let marker = self.styled(ANSI_RED, GENERATION_ERROR_MARKER);
        self.write_flushed(format!("\n{marker}\n").as_bytes());
    }

    fn print_error(&self, error: &str) {
        let _ = self.out().flush();
        eprintln!("Error: {error}");
    }

    fn print_info(&self, info: &str) {
        let info = self.styled(ANSI_DIM, info);
        self.write_flushed(format!("{info}\n").as_bytes());
    }
}

impl<W: Write + Send> EventSink for PlainTextRenderer<W> {
    fn on_event(&self, event: GenerationEvent<'_>) {
        match event {
            GenerationEvent::Chunk(text) => self.print_text(text),
            GenerationEvent::Finished => self.finish_response(),
            GenerationEvent::Error => self.print_generation_error(),
        }
    }
}
