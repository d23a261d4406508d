//! Splitting an input line into the words handed to built-ins and `exec`.

/// Characters that separate tokens on a command line.
pub const WHITESPACE: &[char] = &[' ', '\t', '\n'];

/// Bounded list of whitespace-delimited tokens from one command line.
///
/// The first token names the command, the rest are its arguments. The list is
/// refilled in place by [`TokenList::parse`]; whatever it held before is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<String>,
    max_args: usize,
    max_token_len: usize,
}

impl TokenList {
    /// Create an empty list holding at most `max_args` tokens of at most
    /// `max_token_len` bytes each.
    pub fn new(max_args: usize, max_token_len: usize) -> Self {
        Self {
            tokens: Vec::with_capacity(max_args),
            max_args,
            max_token_len,
        }
    }

    /// Replace the contents with the tokens of `line`.
    ///
    /// Runs of delimiters never produce empty tokens. Tokens past the arity
    /// limit are ignored and overlong tokens are cut at a character boundary.
    pub fn parse(&mut self, line: &str) {
        self.tokens.clear();
        let fragments = line
            .split(WHITESPACE)
            .filter(|fragment| !fragment.is_empty())
            .take(self.max_args);
        for fragment in fragments {
            self.tokens
                .push(truncate_at_boundary(fragment, self.max_token_len).to_owned());
        }
    }

    /// The command name, if the line had any tokens.
    pub fn command(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Everything after the command name.
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
pub fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
