//! The chat application from startup to exit code.
//!
//! [`run_chat`] starts the session, runs the shell, and tears the session down again.  The
//! binary supplies the real engine and terminal; tests supply scripted ones.

use std::sync::Arc;

use crate::chat::config::SessionConfig;
use crate::chat::session::SessionController;
use crate::chat::shell::{LineReader, Shell, ShellExit};
use crate::chat::template::TurnFormatter;
use crate::engine::{Engine, EventSink};
use crate::error::Result;
use crate::interrupt::{INTERRUPT_NOTICE, handle_interrupt};
use crate::render::Renderer;

/// Printed before the engine is initialized.
pub const STARTING_BANNER: &str = "RKLLM starting, please wait...";

/// Printed once the engine is ready.
pub const READY_BANNER: &str = "RKLLM init success!";

/// Printed after the ready banner.
pub const EXIT_HINT: &str = "Enter either 'exit' or 'quit' to terminate.";

/// Printed last on a normal exit.
pub const GOODBYE: &str = "Goodbye!";

/// Runs a chat session and returns the process exit code.
///
/// The session is started with `config` and streams into `renderer`.  `open_reader` is only
/// called once the engine is up, so a failed start never touches the terminal.  Every path out
/// of this function leaves the session shut down:
///
/// - `0` after an exit keyword or end of input.
/// - The engine's status if it refuses to start.
/// - `2` after Ctrl-C at the prompt.
/// - The error's exit code if the shell fails.
pub fn run_chat<E, R, L, F>(
    config: &SessionConfig,
    controller: &SessionController<E>,
    renderer: &Arc<R>,
    open_reader: F,
) -> i32
where
    E: Engine,
    R: Renderer + 'static,
    L: LineReader,
    F: FnOnce() -> Result<L>,
{
    renderer.print_info(STARTING_BANNER);
    if !config.quiet {
        for line in config.to_string().lines() {
            renderer.print_info(line);
        }
    }

    let sink: Arc<dyn EventSink> = renderer.clone();
    if let Err(err) = controller.start(&config.engine_params(), sink) {
        renderer.print_error(&err.to_string());
        return err.exit_code();
    }
    renderer.print_info(READY_BANNER);
    renderer.print_info(EXIT_HINT);

    let mut reader = match open_reader() {
        Ok(reader) => reader,
        Err(err) => {
            renderer.print_error(&err.to_string());
            controller.shutdown();
            return err.exit_code();
        }
    };

    let formatter = TurnFormatter::chat_ml(config.system_prompt.clone());
    let shell = Shell::new(controller, formatter, &**renderer, config);
    match shell.run(&mut reader) {
        Ok(ShellExit::Interrupted) => {
            renderer.print_info(INTERRUPT_NOTICE);
            handle_interrupt(controller)
        }
        Ok(ShellExit::Quit | ShellExit::EndOfInput) => {
            controller.shutdown();
            if !config.quiet {
                let stats = controller.stats();
                renderer.print_info(&format!(
                    "Session: {} turns, {} failed generations",
                    stats.turns, stats.generation_failures
                ));
            }
            renderer.print_info(GOODBYE);
            0
        }
        Err(err) => {
            renderer.print_error(&err.to_string());
            controller.shutdown();
            err.exit_code()
        }
    }
}
