use crate::external::LaunchError;
use crate::history::HistoryError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while running one command line.
///
/// Only [`ShellError::is_fatal`] errors end the session; the rest are reported
/// and the shell prompts again.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// A built-in was called with arguments it cannot accept.
    #[error("{0}")]
    BuiltinArg(String),
    #[error("cd: {}: {source}", .path.display())]
    ChangeDirectory { path: PathBuf, source: io::Error },
    #[error("history reference nested more than {0} levels deep")]
    TooDeep(usize),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    pub fn is_fatal(&self) -> bool {
        match self {
            ShellError::Launch(err) => err.is_fatal(),
            ShellError::Io(_) => true,
            _ => false,
        }
    }
}
