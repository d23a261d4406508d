//! `msh`: a small interactive shell with a bounded command history.
//!
//! Each input line is split into whitespace-separated tokens and either run as
//! a built-in (`cd`, `history`, `quit`/`exit`), replayed from history
//! (`!!`, `!n`), or started as a child process that the shell waits for.
//!
//! The main entry point is [`Interpreter`], which owns one session: its
//! [`HistoryStore`](history::HistoryStore), token list and
//! [`Environment`](env::Environment). Lines come from any
//! [`LineSource`]; the binary uses the `rustyline` editor on a terminal and
//! plain buffered reads otherwise.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod history;
mod interpreter;
pub mod io_adapters;
pub mod tokenizer;

#[cfg(test)]
mod test_util;

pub use config::Config;
pub use error::ShellError;
pub use interpreter::Interpreter;
pub use io_adapters::{EditorSource, LineSource, PlainSource};
