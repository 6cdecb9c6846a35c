//! Interactive chat with a model running on the RK3588 NPU.
//!
//! This binary drives the vendor RKLLM runtime through a streaming REPL.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! rkllm-chat -m qwen-1.8b.rkllm
//!
//! # Set a system prompt and cap the answer length
//! rkllm-chat -m qwen-1.8b.rkllm -s "You are a terse assistant." -t 256
//!
//! # Greedy-ish sampling without the configuration echo
//! rkllm-chat -q -m qwen-1.8b.rkllm -K 1 -T 0.2
//! ```
//!
//! # Commands
//!
//! Type `exit` or `quit` (or press Ctrl-D) to leave.  Slash commands:
//! - `/help` - Show available commands
//! - `/stats` - Show session statistics
//! - `/config` - Show the configuration
//! - `/quit` - Exit the application

use std::process;
use std::sync::Arc;

use rkllm_chat::chat::{
    EditorReader, PlainTextRenderer, Renderer, SessionConfig, SessionController, run_chat,
};
use rkllm_chat::engine::RkllmEngine;
use rkllm_chat::error::Error;
use rkllm_chat::interrupt;

/// Main entry point for the rkllm-chat application.
fn main() {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "rkllm-chat".to_string());

    let config = match SessionConfig::parse(args) {
        Ok(config) => config,
        Err(err) => {
            if !matches!(err, Error::Help) {
                eprintln!("{err}");
            }
            println!("{}", SessionConfig::usage(&program));
            process::exit(err.exit_code());
        }
    };

    let renderer = Arc::new(PlainTextRenderer::with_color(config.use_color));
    let controller = Arc::new(SessionController::new(RkllmEngine::new()));
    if let Err(err) = interrupt::install(Arc::clone(&controller)) {
        renderer.print_error(&err.to_string());
        process::exit(err.exit_code());
    }

    let code = run_chat(&config, &*controller, &renderer, EditorReader::new);
    process::exit(code);
}
