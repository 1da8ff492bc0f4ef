//! Input line parsing
//!
//! Lines starting with `/` are commands; anything else is a question.

use medrag_conductor::{ChatMode, UnknownMode};
use thiserror::Error;

/// A REPL command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// `/mode` shows the modes, `/mode <name>` switches
    Mode(Option<ChatMode>),
    /// `/clear` empties the history
    Clear,
    /// `/history` replays the transcript
    History,
    /// `/status` prints mode, backend, and message count
    Status,
    /// `/health` checks the backend
    Health,
    /// `/help`
    Help,
    /// `/quit` or `/exit`
    Quit,
}

/// One line of user input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Nothing but whitespace
    Empty,
    /// A question for the backend
    Query(String),
    /// A slash command
    Command(Command),
}

/// Errors from command parsing
#[derive(Debug, Error)]
pub enum CommandError {
    /// Not a known command
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),

    /// `/mode` with an unrecognized name
    #[error(transparent)]
    Mode(#[from] UnknownMode),
}

/// Parse one input line
pub fn parse_input(line: &str) -> Result<Input, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }

    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Query(line.to_string()));
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    let command = match name.to_lowercase().as_str() {
        "mode" if rest.is_empty() => Command::Mode(None),
        "mode" => Command::Mode(Some(rest.parse()?)),
        "clear" => Command::Clear,
        "history" => Command::History,
        "status" => Command::Status,
        "health" => Command::Health,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Input::Command(command))
}

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  /mode [default|agent]  show modes, or switch mode
  /clear                 clear the chat history
  /history               show the conversation so far
  /status                show mode, backend, and message count
  /health                check that the backend is reachable
  /help                  show this help
  /quit                  exit
Anything else is sent as a question. Ctrl-C stops an answer in progress.";
