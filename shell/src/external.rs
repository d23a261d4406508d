use crate::command::ExitCode;
use crate::env::Environment;
use log::{error, info, warn};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use thiserror::Error;

/// Failure to run an external command.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Nothing executable by that name on `PATH`.
    #[error("{0}: Command not found.")]
    CommandNotFound(String),
    /// The program exists but could not be started.
    #[error("{name}: {source}")]
    Exec { name: String, source: io::Error },
    /// The system refused to create another process.
    #[error("{name}: cannot create process: {source}")]
    Fatal { name: String, source: io::Error },
    #[error("{name}: waiting for child {pid} failed: {source}")]
    Wait {
        name: String,
        pid: u32,
        source: io::Error,
    },
}

impl LaunchError {
    /// The shell cannot go on without the ability to create processes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LaunchError::Fatal { .. })
    }
}

/// How a finished child went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub pid: u32,
    pub code: ExitCode,
}

/// A spawned child that is always reaped.
///
/// If the owner bails out before a successful [`ScopedChild::wait`], dropping
/// the guard kills and waits for the child so no zombie is left behind.
struct ScopedChild(Child);

impl ScopedChild {
    fn pid(&self) -> u32 {
        self.0.id()
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        self.0.wait()
    }
}

impl Drop for ScopedChild {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            warn!("reaping abandoned child {}", self.0.id());
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }
}

/// Run `tokens` (program name first) as a child process and block until it exits.
///
/// The child inherits the shell's standard streams and runs in the shell's
/// working directory.
pub fn launch(tokens: &[String], env: &Environment) -> Result<Outcome, LaunchError> {
    let Some((name, args)) = tokens.split_first() else {
        return Err(LaunchError::CommandNotFound(String::new()));
    };
    let search_paths = env.search_path();
    let program = find_command_path(&search_paths, Path::new(name))
        .ok_or_else(|| LaunchError::CommandNotFound(name.clone()))?;

    let mut command = Command::new(&*program);
    command
        .args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(name);
    }

    let mut child = ScopedChild(command.spawn().map_err(|err| spawn_error(name, err))?);
    let pid = child.pid();
    info!("started {} as pid {}", name, pid);

    let status = child.wait().map_err(|source| LaunchError::Wait {
        name: name.clone(),
        pid,
        source,
    })?;
    let code = match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    };
    if code == 0 {
        info!("pid {} exited with {}", pid, status);
    } else {
        warn!("pid {} exited with {}", pid, status);
    }
    Ok(Outcome { pid, code })
}

fn spawn_error(name: &str, source: io::Error) -> LaunchError {
    let name = name.to_owned();
    match source.kind() {
        io::ErrorKind::NotFound => LaunchError::CommandNotFound(name),
        io::ErrorKind::WouldBlock | io::ErrorKind::OutOfMemory => {
            error!("{}: process creation failed: {}", name, source);
            LaunchError::Fatal { name, source }
        }
        _ => LaunchError::Exec { name, source },
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// - Absolute path: returned if it exists.
/// - `./foo`: returned if it exists relative to the working directory.
/// - Several components (`bin/sh`): returned if it exists.
/// - A bare name: the first existing match among `search_paths` (PATH syntax).
/// - Empty path: `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

/// Regular file with at least one execute bit set.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lock_current_dir;
    use std::fs;
    use std::fs::File;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), path).expect("Expected to find /bin/sh");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nonexistent/dir:/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert!(found.as_ref().starts_with("/bin"), "got {:?}", found);
        assert!(found.as_ref().ends_with("sh"), "got {:?}", found);
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn directories_on_path_are_not_commands() {
        // `/` has a `tmp` directory, which must not count as an executable.
        let res = find_command_path(osstr("/"), Path::new("tmp"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn path_search_skips_files_without_execute_bit() {
        use std::os::unix::fs::PermissionsExt;

        let base = std::env::temp_dir().join(format!("msh_external_{}_perm", std::process::id()));
        let _ = fs::remove_dir_all(&base);
        let (plain_dir, exec_dir) = (base.join("plain"), base.join("exec"));
        fs::create_dir_all(&plain_dir).expect("create plain dir");
        fs::create_dir_all(&exec_dir).expect("create exec dir");

        let plain = plain_dir.join("msh_tool");
        File::create(&plain).expect("touch plain tool");
        fs::set_permissions(&plain, fs::Permissions::from_mode(0o644)).expect("chmod 644");
        let exec = exec_dir.join("msh_tool");
        File::create(&exec).expect("touch exec tool");
        fs::set_permissions(&exec, fs::Permissions::from_mode(0o755)).expect("chmod 755");

        let search = std::env::join_paths([&plain_dir, &exec_dir]).expect("join paths");
        let found = find_command_path(&search, Path::new("msh_tool"));
        let only_plain = find_command_path(plain_dir.as_os_str(), Path::new("msh_tool"));
        let _ = fs::remove_dir_all(&base);

        assert_eq!(found.as_deref(), Some(exec.as_path()));
        assert!(only_plain.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn current_dir_with_dot_prefix() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let tmp_base =
            std::env::temp_dir().join(format!("msh_external_{}_dot", std::process::id()));
        let _ = fs::remove_dir_all(&tmp_base);
        fs::create_dir_all(&tmp_base).expect("create temp dir");
        File::create(tmp_base.join("foo")).expect("touch foo");

        std::env::set_current_dir(&tmp_base).expect("set cwd");
        let res = find_command_path(osstr("/bin"), Path::new("./foo"));
        std::env::set_current_dir(&cwd_before).ok();

        let found = res.expect("Expected to find './foo' in current dir");
        assert_eq!(found.as_ref(), Path::new("./foo"));
        let _ = fs::remove_dir_all(tmp_base);
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("")).is_none());
    }

    #[test]
    fn launch_unknown_command_reports_not_found() {
        let env = Environment::new();
        let err = launch(&argv("definitely-not-a-command-msh-test -x"), &env).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "definitely-not-a-command-msh-test: Command not found."
        );
    }

    #[test]
    #[cfg(unix)]
    fn launch_waits_and_reports_exit_code() {
        let _lock = lock_current_dir();
        let env = Environment::new();

        let ok = launch(&argv("true"), &env).expect("true should run");
        assert!(ok.pid > 0);
        assert_eq!(ok.code, 0);

        let failed = launch(&argv("false"), &env).expect("false should run");
        assert_ne!(failed.code, 0);
        assert_ne!(failed.pid, ok.pid);
    }

    #[test]
    #[cfg(unix)]
    fn launch_non_executable_file_is_exec_error() {
        let _lock = lock_current_dir();
        let file = std::env::temp_dir().join(format!("msh_not_exec_{}", std::process::id()));
        File::create(&file).expect("create plain file");

        let env = Environment::new();
        let err = launch(&[file.to_string_lossy().into_owned()], &env).unwrap_err();
        let _ = fs::remove_file(&file);

        assert!(matches!(err, LaunchError::Exec { .. }), "got {:?}", err);
        assert!(!err.is_fatal());
    }
}
