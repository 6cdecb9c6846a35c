//! Interrupt handling.
//!
//! An interrupt tears the session down and ends the process with SIGINT's number.  The handler
//! may fire while the read loop is itself shutting down, or while a turn is in flight; the
//! session's atomic take-and-destroy makes both cases safe.

use std::process;
use std::sync::Arc;

use crate::chat::SessionController;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::observability::INTERRUPTS;

/// Line printed when an interrupt arrives.
pub const INTERRUPT_NOTICE: &str = "Caught exit signal. Exiting...";

/// Shuts the session down in response to an interrupt.
///
/// Returns the exit code the process should terminate with.
pub fn handle_interrupt<E: Engine>(controller: &SessionController<E>) -> i32 {
    INTERRUPTS.click();
    controller.shutdown();
    Error::Interrupted.exit_code()
}

/// Installs a Ctrl-C handler that shuts `controller` down and exits the process.
///
/// May be called once per process.
pub fn install<E: Engine + 'static>(controller: Arc<SessionController<E>>) -> Result<()> {
    ctrlc::set_handler(move || {
        println!("\n{INTERRUPT_NOTICE}");
        let code = handle_interrupt(&*controller);
        process::exit(code);
    })?;
    Ok(())
}
