//! Command parsing for the chat application.
//!
//! Two kinds of input never reach the engine: the bare exit keywords `exit` and `quit`, and
//! slash commands that inspect the session.

/// Input the shell answers itself instead of sending it to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// List the available commands.
    Help,

    /// Leave the shell and tear the session down.
    Quit,

    /// Print the session counters.
    Stats,

    /// Echo the resolved configuration.
    ShowConfig,

    /// A slash command the shell does not know; carries the message to show.
    Invalid(String),
}

/// Slash commands: accepted names, then a one-line description for the help text.
const SLASH_COMMANDS: &[(&[&str], &str)] = &[
    (&["help", "?"], "List these commands"),
    (&["stats", "status"], "Show session counters"),
    (&["config"], "Show the resolved configuration"),
    (&["quit", "exit", "q"], "Leave the shell"),
];

/// Returns true if `input` is one of the bare exit keywords.
///
/// Surrounding whitespace and ASCII case are ignored.
pub fn is_exit_keyword(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

/// Classifies one line of input.
///
/// Returns `None` when the line is an ordinary turn for the engine.
///
/// # Examples
///
/// ```
/// # use rkllm_chat::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("quit"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
/// assert!(parse_command("Hello there").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    if is_exit_keyword(input) {
        return Some(ChatCommand::Quit);
    }
    let name = input
        .trim()
        .strip_prefix('/')?
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    let command = match name.as_str() {
        "" => ChatCommand::Invalid("Empty command; try /help".to_string()),
        "help" | "?" => ChatCommand::Help,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        other => ChatCommand::Invalid(format!("Unknown command: /{other}")),
    };
    Some(command)
}

/// Returns the command listing shown by `/help`.
pub fn help_text() -> String {
    let mut text = String::from("Commands:\n  exit, quit         Leave the shell");
    for (names, description) in SLASH_COMMANDS {
        let spelled = names
            .iter()
            .map(|name| format!("/{name}"))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("\n  {spelled:<18} {description}"));
    }
    text
}
