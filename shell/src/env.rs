use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The shell's view of the process environment.
///
/// - `vars`: environment variables handed to child processes, and consulted
///   for `HOME` and `PATH`.
/// - `current_dir`: the working directory, kept in sync with the process one.
/// - `should_exit`: set by `quit`/`exit`, checked by the session loop.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state. Variables that are not valid
    /// UTF-8 are skipped.
    pub fn new() -> Self {
        let vars = stdenv::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Target of a bare `cd`.
    pub fn home(&self) -> Option<PathBuf> {
        self.get_var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }

    /// Directories searched for executables, empty when `PATH` is unset.
    pub fn search_path(&self) -> OsString {
        self.get_var("PATH").map(OsString::from).unwrap_or_default()
    }

    /// Change the process working directory, resolving relative paths
    /// against `current_dir`.
    ///
    /// On failure neither the process nor `current_dir` changes.
    pub fn change_dir(&mut self, target: &Path) -> io::Result<&Path> {
        let new_dir = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.current_dir.join(target)
        };
        let canonical = fs::canonicalize(&new_dir)?;
        stdenv::set_current_dir(&canonical)?;
        self.current_dir = canonical;
        Ok(&self.current_dir)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
