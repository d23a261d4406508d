//! Limits and knobs for a shell session.

use thiserror::Error;

/// Number of command lines kept in history.
pub const HISTORY_SIZE: usize = 15;

/// Maximum number of tokens (command plus arguments) kept from one line.
pub const MAX_NUM_ARGUMENTS: usize = 10;

/// Maximum length of a single token, in bytes.
pub const MAX_TOKEN_SIZE: usize = 255;

/// Maximum length of an input line in bytes, counting the newline.
pub const MAX_COMMAND_SIZE: usize = 255;

/// How many history references may chain into each other before giving up.
pub const MAX_BANG_DEPTH: usize = 8;

pub const PROMPT: &str = "msh> ";

/// Runtime configuration of an [`Interpreter`](crate::Interpreter).
///
/// `Default` yields the stock limits above; the binary overrides a few of them
/// from command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the circular history buffer.
    pub history_size: usize,
    /// Tokens beyond this count are silently dropped.
    pub max_args: usize,
    /// Longer tokens are truncated.
    pub max_token_len: usize,
    /// Longer lines are truncated, newline included.
    pub max_line_len: usize,
    /// Depth limit for `!n` references resolving to further references.
    pub max_bang_depth: usize,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_size: HISTORY_SIZE,
            max_args: MAX_NUM_ARGUMENTS,
            max_token_len: MAX_TOKEN_SIZE,
            max_line_len: MAX_COMMAND_SIZE,
            max_bang_depth: MAX_BANG_DEPTH,
            prompt: PROMPT.to_string(),
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("history size must be at least 1")]
    ZeroHistorySize,
    #[error("maximum number of arguments must be at least 1")]
    ZeroMaxArgs,
    #[error("maximum token length must be at least 1 byte")]
    ZeroTokenLen,
    #[error("maximum line length must be at least 2 bytes")]
    LineTooShort,
}

impl Config {
    /// Check that the limits leave room for at least one usable command.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_size == 0 {
            return Err(ConfigError::ZeroHistorySize);
        }
        if self.max_args == 0 {
            return Err(ConfigError::ZeroMaxArgs);
        }
        if self.max_token_len == 0 {
            return Err(ConfigError::ZeroTokenLen);
        }
        if self.max_line_len < 2 {
            return Err(ConfigError::LineTooShort);
        }
        Ok(())
    }
}
