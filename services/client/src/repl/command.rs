//! services/client/src/repl/command.rs
//!
//! Defines the line protocol of the terminal front-end: every input line is
//! either a slash command or a question for the query backend.

use std::path::PathBuf;

const USAGE: &str = "\
Commands:
  <question>            ask the knowledge base
  /k <topK> <question>  ask with a custom number of retrieved chunks
  /upload <path>        upload a document
  /docs [page] [size]   list documents
  /doc <id>             show a document and its chunks
  /rm <id>              delete a document
  /history              load the recent conversation history
  /clear                clear the conversation on screen
  /help                 show this help
  /quit                 leave";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask { question: String, top_k: Option<u32> },
    Upload { path: PathBuf },
    Documents { page: Option<u32>, size: Option<u32> },
    ShowDocument { id: i64 },
    DeleteDocument { id: i64 },
    History,
    Clear,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}', try /help")]
    Unknown(String),
    #[error("Missing argument, usage: {0}")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),
}

impl Command {
    pub fn usage() -> &'static str {
        USAGE
    }

    /// Parses one line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Command::Ask {
                question: line.to_string(),
                top_k: None,
            }));
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "k" => {
                let (top_k, question) = args
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::MissingArgument("/k <topK> <question>"))?;
                let question = question.trim();
                if question.is_empty() {
                    return Err(CommandError::MissingArgument("/k <topK> <question>"));
                }
                Command::Ask {
                    question: question.to_string(),
                    top_k: Some(parse_number(top_k)?),
                }
            }
            "upload" => {
                if args.is_empty() {
                    return Err(CommandError::MissingArgument("/upload <path>"));
                }
                Command::Upload {
                    path: PathBuf::from(args),
                }
            }
            "docs" => {
                let mut numbers = args.split_whitespace();
                Command::Documents {
                    page: numbers.next().map(parse_number).transpose()?,
                    size: numbers.next().map(parse_number).transpose()?,
                }
            }
            "doc" => Command::ShowDocument {
                id: required_id(args, "/doc <id>")?,
            },
            "rm" => Command::DeleteDocument {
                id: required_id(args, "/rm <id>")?,
            },
            "history" => Command::History,
            "clear" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str) -> Result<T, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidNumber(raw.to_string()))
}

fn required_id(args: &str, usage: &'static str) -> Result<i64, CommandError> {
    let raw = args
        .split_whitespace()
        .next()
        .ok_or(CommandError::MissingArgument(usage))?;
    parse_number(raw)
}
