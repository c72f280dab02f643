//! Text command parsing.

use thiserror::Error;

/// Recognised text command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `<prefix>show <subreddit>`
    Show {
        /// Subreddit name exactly as typed
        subreddit: String,
    },
    /// `<prefix>help`
    Help,
}

/// Malformed command; answered locally with a usage hint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// `show` needs exactly one argument
    #[error("show expects exactly one subreddit, got {0} argument(s)")]
    ShowArity(usize),
}

/// Parse a message into a command.
///
/// Returns `None` when the leading token is not a command. Matching is
/// case-sensitive and prefix-based on the leading whitespace-separated token,
/// so `.showaww` is a malformed `show` and `.helpme` asks for help.
#[must_use]
pub fn parse_command(text: &str, prefix: &str) -> Option<Result<Command, UsageError>> {
    let mut tokens = text.split_whitespace();
    let name = tokens.next()?.strip_prefix(prefix)?;

    if name.starts_with("show") {
        let args: Vec<&str> = tokens.collect();
        return match args.as_slice() {
            [subreddit] => Some(Ok(Command::Show {
                subreddit: (*subreddit).to_string(),
            })),
            other => Some(Err(UsageError::ShowArity(other.len()))),
        };
    }
    if name.starts_with("help") {
        return Some(Ok(Command::Help));
    }
    None
}
