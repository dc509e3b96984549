//! Commands that run inside the shell process. `cd` is the only one.

use crate::error::BuiltinError;
use crate::parser::Pipeline;
use crate::session::Session;
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Commands that must run inside the shell process because they change its state.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    fn execute(self, session: &mut Session) -> Result<(), BuiltinError>;
}

/// Run the pipeline's head as a builtin if it names one.
///
/// Returns `None` when the head is not a builtin and the line has to go through the
/// pipeline builder. Otherwise the builtin consumes the whole line: any further
/// stages are dropped without being launched.
pub fn dispatch(
    pipeline: &Pipeline,
    session: &mut Session,
    stdout: &mut dyn Write,
) -> Option<Result<(), BuiltinError>> {
    let result = try_run::<Cd>(pipeline, session, stdout)?;
    if pipeline.len() > 1 {
        warn!(
            builtin = Cd::name(),
            ignored = pipeline.connections(),
            "builtin consumed the whole line, later stages were not run"
        );
    }
    Some(result)
}

fn try_run<T: BuiltinCommand>(
    pipeline: &Pipeline,
    session: &mut Session,
    stdout: &mut dyn Write,
) -> Option<Result<(), BuiltinError>> {
    let head = pipeline.head();
    if head.program() != T::name() {
        return None;
    }

    let args: Vec<&str> = head.args().iter().map(String::as_str).collect();
    let result = match T::from_args(&[T::name()], &args) {
        Ok(cmd) => cmd.execute(session),
        Err(EarlyExit { output, status }) => match status {
            Ok(()) => stdout
                .write_all(output.as_bytes())
                .map_err(|source| BuiltinError::Usage(source.to_string())),
            Err(()) => Err(BuiltinError::Usage(output.trim_end().to_string())),
        },
    };
    Some(result)
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, session: &mut Session) -> Result<(), BuiltinError> {
        let target = match self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => session.home_dir().ok_or(BuiltinError::HomeDir)?,
        };

        let new_dir = session.current_dir().join(&target);
        let canonical = enterable_dir(&new_dir).map_err(|source| BuiltinError::Directory {
            path: target,
            source,
        })?;

        debug!(from = %session.current_dir().display(), to = %canonical.display(), "cd");
        session.set_current_dir(canonical);
        Ok(())
    }
}

/// Canonicalize `path` and check that it is a directory the process may enter.
fn enterable_dir(path: &Path) -> io::Result<PathBuf> {
    let canonical = fs::canonicalize(path)?;
    if !fs::metadata(&canonical)?.is_dir() {
        return Err(io::Error::from(io::ErrorKind::NotADirectory));
    }
    ensure_searchable(&canonical)?;
    Ok(canonical)
}

#[cfg(unix)]
fn ensure_searchable(path: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the call.
    if unsafe { libc::access(c_path.as_ptr(), libc::X_OK) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn ensure_searchable(path: &Path) -> io::Result<()> {
    fs::read_dir(path).map(drop)
}
