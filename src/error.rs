//! Error types for rkllm-chat.
//!
//! This module defines the error taxonomy of the chat shell: configuration errors that stop the
//! process before the engine is touched, engine initialization failures, recoverable generation
//! failures, misuse of the session state machine, and terminal failures.

use std::error;
use std::fmt;

/// Exit code reported for usage and argument errors.
pub const EXIT_USAGE: i32 = 1;

/// Exit code reported when no model path is supplied.
pub const EXIT_MISSING_MODEL: i32 = -1;

/// Signal number of SIGINT; the process exits with it after an interrupt.
pub const SIGINT: i32 = 2;

/// The main error type for rkllm-chat.
#[derive(Clone, Debug)]
pub enum Error {
    /// The command line could not be understood.
    Usage {
        /// Human-readable error message.
        message: String,
    },

    /// Help was requested with `-h` or `--help`.
    Help,

    /// No model path was given, or it was blank after trimming.
    MissingModel,

    /// An option carried a value that could not be parsed or is out of range.
    InvalidArgument {
        /// Long name of the offending option.
        option: String,
        /// The raw value supplied on the command line.
        value: String,
        /// Human-readable error message.
        message: String,
    },

    /// The inference engine refused to initialize.
    EngineInit {
        /// Status code returned by the engine.
        status: i32,
    },

    /// The inference engine reported a failed run.
    Generation {
        /// Status code returned by the engine.
        status: i32,
    },

    /// An operation was attempted in a state that does not permit it.
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the session was in.
        state: &'static str,
    },

    /// The operator interrupted the shell.
    Interrupted,

    /// The line editor failed for a reason other than end of input or interrupt.
    Readline {
        /// Human-readable error message.
        message: String,
    },

    /// The interrupt handler could not be installed.
    Signal {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Creates a new usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage {
            message: message.into(),
        }
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(
        option: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::InvalidArgument {
            option: option.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Creates a new engine initialization error.
    pub fn engine_init(status: i32) -> Self {
        Error::EngineInit { status }
    }

    /// Creates a new generation error.
    pub fn generation(status: i32) -> Self {
        Error::Generation { status }
    }

    /// Creates a new invalid state error.
    pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
        Error::InvalidState { operation, state }
    }

    /// Creates a new line editor error.
    pub fn readline(message: impl Into<String>) -> Self {
        Error::Readline {
            message: message.into(),
        }
    }

    /// Creates a new signal handler error.
    pub fn signal(message: impl Into<String>) -> Self {
        Error::Signal {
            message: message.into(),
        }
    }

    /// Returns true if this error is a failed generation.
    ///
    /// Generation errors are recoverable: the session stays ready for the next turn.
    pub fn is_generation(&self) -> bool {
        matches!(self, Error::Generation { .. })
    }

    /// Returns true if this error is a state machine violation.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState { .. })
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage { .. } | Error::Help | Error::InvalidArgument { .. } => EXIT_USAGE,
            Error::MissingModel => EXIT_MISSING_MODEL,
            Error::EngineInit { status } => *status,
            Error::Interrupted => SIGINT,
            _ => EXIT_USAGE,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Usage { message } => {
                write!(f, "Usage error: {message}")
            }
            Error::Help => {
                write!(f, "Help requested")
            }
            Error::MissingModel => {
                write!(f, "Model file needed.")
            }
            Error::InvalidArgument {
                option,
                value,
                message,
            } => {
                write!(f, "Invalid value {value:?} for --{option}: {message}")
            }
            Error::EngineInit { status } => {
                write!(f, "Engine initialization failed (status {status})")
            }
            Error::Generation { status } => {
                write!(f, "Generation failed (status {status})")
            }
            Error::InvalidState { operation, state } => {
                write!(f, "Cannot {operation} while session is {state}")
            }
            Error::Interrupted => {
                write!(f, "Interrupted")
            }
            Error::Readline { message } => {
                write!(f, "Input error: {message}")
            }
            Error::Signal { message } => {
                write!(f, "Signal handler error: {message}")
            }
        }
    }
}

impl error::Error for Error {}

impl From<ctrlc::Error> for Error {
    fn from(err: ctrlc::Error) -> Self {
        Error::signal(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for Error {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Error::readline(err.to_string())
    }
}

impl From<getopts::Fail> for Error {
    fn from(err: getopts::Fail) -> Self {
        Error::usage(err.to_string())
    }
}

/// A specialized Result type for rkllm-chat operations.
pub type Result<T> = std::result::Result<T, Error>;
