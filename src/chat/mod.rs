//! Chat application module for interactive sessions with an on-device model.
//!
//! This module provides the REPL that drives the inference engine:
//!
//! - Streaming responses with real-time token display
//! - ChatML prompt formatting
//! - Exit keywords and slash commands for session control
//! - Orderly teardown on exit, end of input, or interrupt
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`template`]: prompt formatting
//! - [`session`]: engine lifecycle management
//! - [`commands`]: exit keyword and slash command parsing
//! - [`shell`]: the read loop
//! - [`app`]: startup, the read loop and teardown, ending in an exit code

mod app;
mod commands;
mod config;
mod session;
mod shell;
mod template;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use app::{EXIT_HINT, GOODBYE, READY_BANNER, STARTING_BANNER, run_chat};
pub use commands::{ChatCommand, help_text, is_exit_keyword, parse_command};
pub use config::{DEFAULT_SYSTEM_PROMPT, SessionConfig, TARGET_PLATFORM};
pub use session::{SessionController, SessionState, SessionStats};
pub use shell::{EditorReader, LineReader, PROMPT, ReadOutcome, Shell, ShellExit};
pub use template::{ChatMlTemplate, IM_END, IM_START, PromptTemplate, TurnFormatter};
