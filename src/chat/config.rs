//! Configuration types for the chat application.
//!
//! This module resolves the command line into a [`SessionConfig`] via `getopts`.  The resolved
//! record is immutable; it is built once at startup and read for the rest of the process.

use std::ffi::OsStr;
use std::fmt;
use std::str::FromStr;

use getopts::{Matches, Options};

use crate::engine::EngineParams;
use crate::error::{Error, Result};

/// Default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Platform the runtime is built for.
pub const TARGET_PLATFORM: &str = "rk3588";

const DEFAULT_NUM_NPU_CORE: i32 = 1;
const DEFAULT_MAX_CONTEXT_LEN: i32 = 512;
const DEFAULT_MAX_NEW_TOKENS: i32 = -1;
const DEFAULT_TOP_K: i32 = 40;
const DEFAULT_TOP_P: f32 = 0.9;
const DEFAULT_TEMPERATURE: f32 = 0.8;
const DEFAULT_REPEAT_PENALTY: f32 = 1.1;
const DEFAULT_FREQUENCY_PENALTY: f32 = 0.0;
const DEFAULT_PRESENCE_PENALTY: f32 = 0.0;
const DEFAULT_MIROSTAT: i32 = 0;
const DEFAULT_MIROSTAT_TAU: f32 = 5.0;
const DEFAULT_MIROSTAT_ETA: f32 = 0.1;

/// Configuration for a chat session.
///
/// Core counts, lengths, top-k, top-p and temperature are range-checked by [`SessionConfig::parse`].
/// Penalty and mirostat values are handed to the engine as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Path to the model file, trimmed of surrounding whitespace.
    pub model_path: String,

    /// Platform identifier handed to the engine.
    pub target_platform: String,

    /// Number of NPU cores to use.
    pub num_npu_core: i32,

    /// Context window length.
    pub max_context_len: i32,

    /// Maximum new tokens per turn; `-1` means unbounded.
    pub max_new_tokens: i32,

    /// Top-k sampling width.
    pub top_k: i32,

    /// Nucleus sampling threshold in `[0, 1]`.
    pub top_p: f32,

    /// Sampling temperature in `[0, 2]`.
    pub temperature: f32,

    /// Repetition penalty.
    pub repeat_penalty: f32,

    /// Frequency penalty.
    pub frequency_penalty: f32,

    /// Presence penalty.
    pub presence_penalty: f32,

    /// Mirostat mode.
    pub mirostat: i32,

    /// Mirostat target entropy.
    pub mirostat_tau: f32,

    /// Mirostat learning rate.
    pub mirostat_eta: f32,

    /// System prompt prepended to every turn.
    pub system_prompt: String,

    /// Suppress the configuration echo and session summary.
    pub quiet: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl SessionConfig {
    /// Creates a configuration for `model_path` with every other field at its default.
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            target_platform: TARGET_PLATFORM.to_string(),
            num_npu_core: DEFAULT_NUM_NPU_CORE,
            max_context_len: DEFAULT_MAX_CONTEXT_LEN,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            top_k: DEFAULT_TOP_K,
            top_p: DEFAULT_TOP_P,
            temperature: DEFAULT_TEMPERATURE,
            repeat_penalty: DEFAULT_REPEAT_PENALTY,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            presence_penalty: DEFAULT_PRESENCE_PENALTY,
            mirostat: DEFAULT_MIROSTAT,
            mirostat_tau: DEFAULT_MIROSTAT_TAU,
            mirostat_eta: DEFAULT_MIROSTAT_ETA,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            quiet: false,
            use_color: true,
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets quiet mode.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Resolves command-line arguments (without the program name) into a configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Help`] when `-h`/`--help` is present.
    /// - [`Error::Usage`] for unknown options, missing option values or stray arguments.
    /// - [`Error::InvalidArgument`] for malformed or out-of-range numbers.
    /// - [`Error::MissingModel`] when the model path is absent or blank.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let matches = options().parse(args)?;
        if matches.opt_present("help") {
            return Err(Error::Help);
        }
        if let Some(stray) = matches.free.first() {
            return Err(Error::usage(format!("unexpected argument: {stray}")));
        }

        let mut config = SessionConfig::new(String::new());
        config.quiet = matches.opt_present("quiet");
        config.use_color = !matches.opt_present("no-color");
        if let Some(system) = matches.opt_str("system") {
            config.system_prompt = system;
        }

        config.num_npu_core = parse_value(&matches, "num", DEFAULT_NUM_NPU_CORE)?;
        check_at_least("num", config.num_npu_core, 1)?;
        config.max_context_len = parse_value(&matches, "context", DEFAULT_MAX_CONTEXT_LEN)?;
        check_at_least("context", config.max_context_len, 1)?;
        config.max_new_tokens = parse_value(&matches, "tokens", DEFAULT_MAX_NEW_TOKENS)?;
        check_at_least("tokens", config.max_new_tokens, -1)?;

        config.top_k = parse_value(&matches, "top_k", DEFAULT_TOP_K)?;
        check_at_least("top_k", config.top_k, 0)?;
        config.top_p = parse_value(&matches, "top_p", DEFAULT_TOP_P)?;
        check_in_range("top_p", config.top_p, 0.0, 1.0)?;
        config.temperature = parse_value(&matches, "temp", DEFAULT_TEMPERATURE)?;
        check_in_range("temp", config.temperature, 0.0, 2.0)?;

        config.repeat_penalty = parse_value(&matches, "repeat_penalty", DEFAULT_REPEAT_PENALTY)?;
        config.frequency_penalty =
            parse_value(&matches, "frequency_penalty", DEFAULT_FREQUENCY_PENALTY)?;
        config.presence_penalty =
            parse_value(&matches, "presence_penalty", DEFAULT_PRESENCE_PENALTY)?;

        config.mirostat = parse_value(&matches, "mirostat", DEFAULT_MIROSTAT)?;
        config.mirostat_tau = parse_value(&matches, "mirostat_tau", DEFAULT_MIROSTAT_TAU)?;
        config.mirostat_eta = parse_value(&matches, "mirostat_eta", DEFAULT_MIROSTAT_ETA)?;

        config.model_path = matches
            .opt_str("model")
            .map(|path| path.trim().to_string())
            .unwrap_or_default();
        if config.model_path.is_empty() {
            return Err(Error::MissingModel);
        }
        Ok(config)
    }

    /// Returns the help text for `program`.
    pub fn usage(program: &str) -> String {
        options().usage(&format!("Usage: {program} -m <rkllm_model_path> [OPTIONS]"))
    }

    /// Converts the configuration into the parameters handed to the engine.
    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            model_path: self.model_path.clone(),
            target_platform: self.target_platform.clone(),
            num_npu_core: self.num_npu_core,
            max_context_len: self.max_context_len,
            max_new_tokens: self.max_new_tokens,
            top_k: self.top_k,
            top_p: self.top_p,
            temperature: self.temperature,
            repeat_penalty: self.repeat_penalty,
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
            mirostat: self.mirostat,
            mirostat_tau: self.mirostat_tau,
            mirostat_eta: self.mirostat_eta,
        }
    }
}

impl fmt::Display for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "param.model_path {}", self.model_path)?;
        writeln!(f, "param.target_platform {}", self.target_platform)?;
        writeln!(f, "param.num_npu_core {}", self.num_npu_core)?;
        writeln!(f, "param.max_context_len {}", self.max_context_len)?;
        writeln!(f, "param.max_new_tokens {}", self.max_new_tokens)?;
        writeln!(f, "param.top_k {}", self.top_k)?;
        writeln!(f, "param.top_p {}", self.top_p)?;
        writeln!(f, "param.temperature {}", self.temperature)?;
        writeln!(f, "param.repeat_penalty {}", self.repeat_penalty)?;
        writeln!(f, "param.frequency_penalty {}", self.frequency_penalty)?;
        writeln!(f, "param.presence_penalty {}", self.presence_penalty)?;
        writeln!(f, "param.mirostat {}", self.mirostat)?;
        writeln!(f, "param.mirostat_tau {}", self.mirostat_tau)?;
        writeln!(f, "param.mirostat_eta {}", self.mirostat_eta)?;
        write!(f, "param.system_prompt {}", self.system_prompt)
    }
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optflag("q", "quiet", "Quiet mode");
    opts.optopt("m", "model", "RKLLM model file to run", "FILE");
    opts.optopt("s", "system", "System prompt", "TEXT");
    opts.optopt("n", "num", "Number of NPU cores to use (1)", "INT");
    opts.optopt("c", "context", "Set context window (512)", "INT");
    opts.optopt("t", "tokens", "Set max tokens generated (-1)", "INT");
    opts.optopt("K", "top_k", "Set sampling (reduced vocabulary) (40)", "INT");
    opts.optopt(
        "P",
        "top_p",
        "Set nucleus sampling (vocabulary size), 0 <= top_p <= 1 (0.9)",
        "FLOAT",
    );
    opts.optopt("T", "temp", "Set randomness level, 0 <= temp <= 2 (0.8)", "FLOAT");
    opts.optopt(
        "r",
        "repeat_penalty",
        "Reduce token reuse, 0 <= penalty <= 100 (1.1)",
        "FLOAT",
    );
    opts.optopt(
        "f",
        "frequency_penalty",
        "Decrease likelihood to repeat the same line verbatim, -2 <= penalty <= 2 (0)",
        "FLOAT",
    );
    opts.optopt(
        "p",
        "presence_penalty",
        "Increase likelihood to talk about new topics, -2 <= penalty <= 2 (0)",
        "FLOAT",
    );
    opts.optopt("v", "mirostat", "Set mirostat version, 0, 1 or 2 (0)", "INT");
    opts.optopt("e", "mirostat_tau", "Set mirostat target entropy (5)", "FLOAT");
    opts.optopt(
        "l",
        "mirostat_eta",
        "Set mirostat learning rate, 0.05 <= eta <= 0.2 (0.1)",
        "FLOAT",
    );
    opts.optflag("", "no-color", "Disable ANSI colors/styles");
    opts.optflag("h", "help", "Show this help");
    opts
}

trait Numeric: FromStr + Copy {
    const EXPECTED: &'static str;

    fn is_finite(self) -> bool {
        true
    }
}

impl Numeric for i32 {
    const EXPECTED: &'static str = "expected an integer";
}

impl Numeric for f32 {
    const EXPECTED: &'static str = "expected a number";

    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}

fn parse_value<T: Numeric>(matches: &Matches, name: &str, default: T) -> Result<T> {
    let Some(raw) = matches.opt_str(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(Error::invalid_argument(name, raw, T::EXPECTED)),
    }
}

fn check_at_least(name: &str, value: i32, min: i32) -> Result<()> {
    if value >= min {
        Ok(())
    } else {
        Err(Error::invalid_argument(
            name,
            value.to_string(),
            format!("must be at least {min}"),
        ))
    }
}

fn check_in_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::invalid_argument(
            name,
            value.to_string(),
            format!("expects a value between {min} and {max}"),
        ))
    }
}
