/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// What a command line asks the shell to do, decided from its first token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `!!` or `!n`: re-run something from history.
    HistoryReference,
    /// `quit` or `exit`.
    Quit,
    /// `cd [dir]`
    ChangeDirectory,
    /// `history [-p]`
    ShowHistory,
    /// Anything else, run as a child process.
    External,
}

impl CommandKind {
    pub fn classify(name: &str) -> Self {
        match name {
            _ if name.starts_with('!') => CommandKind::HistoryReference,
            "quit" | "exit" => CommandKind::Quit,
            "cd" => CommandKind::ChangeDirectory,
            "history" => CommandKind::ShowHistory,
            _ => CommandKind::External,
        }
    }
}
