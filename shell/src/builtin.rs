use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::ShellError;
use crate::history::HistoryStore;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "history" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the session state.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<ExitCode, ShellError>;
}

/// Parse `args` for builtin `T` and run it.
///
/// Arguments are taken literally: a `--` is put in front of them, so
/// `help` or `-build` reach the command as plain positionals. Anything
/// `argh` still rejects is reported on `stderr` with exit code 1.
pub(crate) fn run_builtin<T: BuiltinCommand>(
    args: &[String],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    env: &mut Environment,
    history: &HistoryStore,
) -> Result<ExitCode, ShellError> {
    let args: Vec<&str> = std::iter::once("--")
        .chain(args.iter().map(String::as_str))
        .collect();
    match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd.execute(stdout, env, history),
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => {
                writeln!(stdout, "{}", output.trim_end())?;
                Ok(0)
            }
            Err(()) => {
                writeln!(stderr, "{}", output.trim_end())?;
                Ok(1)
            }
        },
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub targets: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        _history: &HistoryStore,
    ) -> Result<ExitCode, ShellError> {
        let mut targets = self.targets.into_iter();
        let target = match (targets.next(), targets.next()) {
            (_, Some(_)) => return Err(ShellError::BuiltinArg("cd: too many args".into())),
            (Some(t), None) => PathBuf::from(t),
            (None, None) => env
                .home()
                .ok_or_else(|| ShellError::BuiltinArg("cd: HOME not set".into()))?,
        };

        env.change_dir(&target)
            .map_err(|source| ShellError::ChangeDirectory {
                path: target.clone(),
                source,
            })?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the remembered commands, oldest first, numbered for use with !n.
/// With `-p` as the first argument, also print the pid each command started.
pub struct ShowHistory {
    #[argh(positional, greedy)]
    /// pass -p first to also show pids; anything else is ignored.
    pub args: Vec<String>,
}

impl ShowHistory {
    fn show_pids(&self) -> bool {
        self.args.first().map(String::as_str) == Some("-p")
    }
}

impl BuiltinCommand for ShowHistory {
    fn name() -> &'static str {
        "history"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        history: &HistoryStore,
    ) -> Result<ExitCode, ShellError> {
        history.print(stdout, self.show_pids())?;
        Ok(0)
    }
}
