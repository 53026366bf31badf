//! Parsing of interactive commands.

use std::path::PathBuf;

/// A command entered at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        author: String,
        title: String,
        file: PathBuf,
    },
    List,
    Detail(u64),
    Fetch(u64),
    Help,
    Exit,
}

/// Why a line could not be turned into a command
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid paper number: {0}")]
    InvalidId(String),

    #[error("Invalid command: {0} (type 'help' for the command list)")]
    Unknown(String),
}

impl Command {
    /// Parse one input line; `None` for a blank line
    pub fn parse(line: &str) -> Option<Result<Command, CommandError>> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (&name, args) = parts.split_first()?;

        let command = match name {
            "add" => match args {
                [author, title, file] => Ok(Command::Add {
                    author: author.to_string(),
                    title: title.to_string(),
                    file: PathBuf::from(file),
                }),
                _ => Err(CommandError::Usage("add <author> <title> <file>")),
            },
            "list" => Ok(Command::List),
            "detail" => parse_id(args, "detail <paper_number>").map(Command::Detail),
            "fetch" => parse_id(args, "fetch <paper_number>").map(Command::Fetch),
            "help" => Ok(Command::Help),
            "exit" | "quit" => Ok(Command::Exit),
            other => Err(CommandError::Unknown(other.to_string())),
        };

        Some(command)
    }
}

fn parse_id(args: &[&str], usage: &'static str) -> Result<u64, CommandError> {
    match args {
        [id] => id
            .parse()
            .map_err(|_| CommandError::InvalidId(id.to_string())),
        _ => Err(CommandError::Usage(usage)),
    }
}
