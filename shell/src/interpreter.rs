use crate::builtin::{Cd, ShowHistory, run_builtin};
use crate::command::{CommandKind, ExitCode};
use crate::config::Config;
use crate::env::Environment;
use crate::error::ShellError;
use crate::external;
use crate::history::HistoryStore;
use crate::io_adapters::LineSource;
use crate::tokenizer::{TokenList, truncate_at_boundary};
use log::{debug, warn};
use std::io::{self, Write};

/// How a line reached the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Typed by the user; recorded into history before it runs.
    Typed,
    /// Pulled out of history slot `slot` by a bang reference; not recorded again.
    Replayed { slot: usize },
}

/// An interactive shell session.
///
/// Owns everything one session needs: the configuration, the [`Environment`],
/// the [`HistoryStore`], the current [`TokenList`] and the streams built-ins
/// write to. External commands inherit the process's own standard streams.
///
/// Example
/// ```
/// use msh::{Config, Interpreter};
/// let mut sh = Interpreter::new(Config::default());
/// sh.run_line("history\n").unwrap();
/// assert_eq!(sh.history().len(), 1);
/// ```
pub struct Interpreter {
    config: Config,
    env: Environment,
    history: HistoryStore,
    tokens: TokenList,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Interpreter {
    /// Create a session on the process environment and standard streams.
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            config,
            Environment::new(),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    /// Create a session with an explicit environment and output streams.
    pub fn with_parts(
        config: Config,
        env: Environment,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            history: HistoryStore::new(config.history_size),
            tokens: TokenList::new(config.max_args, config.max_token_len),
            config,
            env,
            stdout,
            stderr,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Whether `quit` or `exit` has been seen.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Prompt, read and run lines until `quit`/`exit` or end of input.
    ///
    /// Per-line errors are reported and the loop goes on; only a fatal error
    /// (the system refusing to create processes, or the shell's own output
    /// failing) is returned.
    pub fn run_session(&mut self, input: &mut dyn LineSource) -> anyhow::Result<()> {
        while !self.env.should_exit {
            let Some(raw) = input.read_line(&self.config.prompt)? else {
                debug!("end of input");
                break;
            };
            if let Err(err) = self.run_line(&raw) {
                if err.is_fatal() {
                    return Err(err.into());
                }
                self.report(&err)?;
            }
        }
        self.stdout.flush()?;
        Ok(())
    }

    /// Run one raw input line, trailing newline allowed.
    ///
    /// Blank lines do nothing. `quit`/`exit` only set the exit flag and are
    /// never recorded.
    pub fn run_line(&mut self, raw: &str) -> Result<(), ShellError> {
        let line = self.clip(raw);
        self.tokens.parse(line);
        if self.tokens.is_empty() {
            return Ok(());
        }
        self.dispatch(line, Origin::Typed, 0).map(|code| {
            debug!("{:?} finished with {}", line, code);
        })
    }

    /// Route the line whose tokens are currently in `self.tokens`.
    fn dispatch(&mut self, line: &str, origin: Origin, depth: usize) -> Result<ExitCode, ShellError> {
        let Some(name) = self.tokens.command() else {
            return Ok(0);
        };
        let kind = CommandKind::classify(name);
        debug!("dispatching {:?} as {:?} ({:?})", line, kind, origin);

        match kind {
            CommandKind::HistoryReference => {
                if depth >= self.config.max_bang_depth {
                    return Err(ShellError::TooDeep(self.config.max_bang_depth));
                }
                let resolved = self.history.resolve_bang(name)?;
                let (slot, resolved_line) = (resolved.index, resolved.line.to_owned());
                self.tokens.parse(&resolved_line);
                self.dispatch(&resolved_line, Origin::Replayed { slot }, depth + 1)
            }
            CommandKind::Quit => {
                self.env.should_exit = true;
                Ok(0)
            }
            CommandKind::ChangeDirectory | CommandKind::ShowHistory | CommandKind::External => {
                let slot = match origin {
                    Origin::Typed => self.history.record(line),
                    Origin::Replayed { slot } => slot,
                };
                self.execute(kind, slot)
            }
        }
    }

    /// Run a built-in or external command; `slot` is its history entry.
    fn execute(&mut self, kind: CommandKind, slot: usize) -> Result<ExitCode, ShellError> {
        let code = match kind {
            CommandKind::ChangeDirectory => run_builtin::<Cd>(
                self.tokens.args(),
                &mut *self.stdout,
                &mut *self.stderr,
                &mut self.env,
                &self.history,
            )?,
            CommandKind::ShowHistory => run_builtin::<ShowHistory>(
                self.tokens.args(),
                &mut *self.stdout,
                &mut *self.stderr,
                &mut self.env,
                &self.history,
            )?,
            _ => {
                self.stdout.flush()?;
                let outcome = external::launch(self.tokens.as_slice(), &self.env)?;
                if let Err(err) = self.history.attach_pid(slot, outcome.pid) {
                    warn!("pid {} not recorded: {}", outcome.pid, err);
                }
                outcome.code
            }
        };
        self.stdout.flush()?;
        Ok(code)
    }

    /// History lookups answer on stdout; everything else is an error on stderr.
    fn report(&mut self, err: &ShellError) -> io::Result<()> {
        match err {
            ShellError::History(_) => {
                writeln!(self.stdout, "{}", err)?;
                self.stdout.flush()
            }
            _ => writeln!(self.stderr, "{}", err),
        }
    }

    /// Strip the line terminator and enforce the input length limit.
    fn clip<'a>(&self, raw: &'a str) -> &'a str {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let limit = self.config.max_line_len.saturating_sub(1);
        let clipped = truncate_at_boundary(line, limit);
        if clipped.len() < line.len() {
            warn!("input line truncated to {} bytes", clipped.len());
        }
        clipped
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
