use anyhow::Context;
use argh::FromArgs;
use msh::config::{self, Config};
use msh::{EditorSource, Interpreter, PlainSource};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

#[derive(FromArgs)]
/// A small interactive shell with a bounded, replayable command history.
struct Options {
    #[argh(option, default = "config::HISTORY_SIZE")]
    /// number of commands kept in history.
    history_size: usize,

    #[argh(option, default = "config::MAX_NUM_ARGUMENTS")]
    /// maximum number of words kept from one command line.
    max_args: usize,

    #[argh(switch)]
    /// read plain lines from standard input instead of using the line editor.
    plain: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let options: Options = argh::from_env();

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("msh: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(options: Options) -> anyhow::Result<()> {
    let config = Config {
        history_size: options.history_size,
        max_args: options.max_args,
        ..Config::default()
    };
    config.validate().context("invalid options")?;

    let mut sh = Interpreter::new(config);
    if options.plain || !io::stdin().is_terminal() {
        let mut input = PlainSource::new(io::stdin().lock(), io::stdout());
        sh.run_session(&mut input)
    } else {
        let mut input = EditorSource::new().context("cannot start line editor")?;
        sh.run_session(&mut input)
    }
}
