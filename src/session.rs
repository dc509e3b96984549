//! Per-shell state carried across input lines.

use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// State that survives from one input line to the next.
///
/// The session contains:
/// - `vars`: environment variables handed to every launched stage and used for
///   `PATH`/`HOME` lookups.
/// - `current_dir`: the working directory of launched stages. Only the builtin
///   dispatcher changes it; the shell process never calls `chdir` itself.
#[derive(Debug, Clone)]
pub struct Session {
    vars: HashMap<String, String>,
    current_dir: PathBuf,
}

impl Session {
    /// Capture the current process state into a new `Session`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self { vars, current_dir }
    }

    /// Build a session from explicit parts, ignoring the process environment.
    pub fn with_parts(vars: HashMap<String, String>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            vars,
            current_dir: current_dir.into(),
        }
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub(crate) fn set_current_dir(&mut self, dir: PathBuf) {
        self.current_dir = dir;
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn remove_var(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Home directory used by `cd` without an operand.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.get_var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_var() {
        let mut session = Session::with_parts(HashMap::new(), "/");

        assert_eq!(session.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        session.set_var("KEY", "VALUE");
        assert_eq!(session.get_var("KEY"), Some("VALUE"));

        assert_eq!(session.remove_var("KEY"), Some("VALUE".to_string()));
        assert_eq!(session.get_var("KEY"), None);
    }

    #[test]
    fn captures_process_env() {
        let session = Session::new();
        assert!(session.get_var("PATH").is_some());
        assert!(session.current_dir().is_absolute());
    }

    #[test]
    fn empty_home_is_unresolvable() {
        let mut session = Session::with_parts(HashMap::new(), "/");
        assert_eq!(session.home_dir(), None);

        session.set_var("HOME", "");
        assert_eq!(session.home_dir(), None);

        session.set_var("HOME", "/home/someone");
        assert_eq!(session.home_dir(), Some(PathBuf::from("/home/someone")));
    }
}
