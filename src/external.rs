//! Locating external programs and translating how they exited.

use crate::command::ExitCode;
use crate::session::Session;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::process::ExitStatus;

/// Resolve a stage's program name to an executable using the session's `PATH`
/// and working directory.
pub fn resolve_program(program: &str, session: &Session) -> Option<PathBuf> {
    let search_paths = OsStr::new(session.get_var("PATH").unwrap_or_default());
    find_command_path(search_paths, session.current_dir(), Path::new(program)).map(Cow::into_owned)
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it names an executable file.
/// - Relative with multiple components (e.g., `bin/sh` or `./foo`): resolved against `cwd`.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable match. Relative PATH entries are taken relative to `cwd`.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(
    search_paths: &OsStr,
    cwd: &Path,
    path: &'a Path,
) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        // Empty path -> not found
        (None, _) => None,
        // Single component -> search in PATH
        (Some(Component::Normal(name)), None) => {
            find_in_path(search_paths, cwd, name).map(Cow::Owned)
        }
        // Anything else -> relative to the working directory
        _ => find_by_path(cwd.join(path)).map(Cow::Owned),
    }
}

fn find_in_path(search_paths: &OsStr, cwd: &Path, cmd: &OsStr) -> Option<PathBuf> {
    if search_paths.is_empty() {
        return None;
    }
    std::env::split_paths(search_paths)
        .find_map(|dir| find_by_path(cwd.join(dir).join(cmd)))
}

fn find_by_path<P: AsRef<Path>>(path: P) -> Option<P> {
    if is_executable(path.as_ref()) {
        Some(path)
    } else {
        None
    }
}

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

/// Translate a child's exit status into a shell exit code.
pub fn exit_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(code) => code,
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
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
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::{self, File};
    use std::os::unix::fs::PermissionsExt;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn touch_executable(path: &Path) {
        File::create(path).expect("touch");
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    #[test]
    fn absolute_existing() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), Path::new("/"), path)
            .expect("Expected to find /bin/sh via absolute path");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/"), Path::new("/bin/nonexisting"));
        assert!(res.is_none(), "Expected not to find /bin/nonexisting");
    }

    #[test]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nonexistent:/bin"), Path::new("/"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("/"), Path::new("nonexisting"));
        assert!(res.is_none(), "Expected not to find 'nonexisting' in PATH");
    }

    #[test]
    fn empty_search_path_finds_nothing() {
        let res = find_command_path(osstr(""), Path::new("/bin"), Path::new("sh"));
        assert!(res.is_none());
    }

    #[test]
    fn multiple_components_resolve_against_cwd() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join("bin")).expect("create bin dir");
        touch_executable(&tmp.path().join("bin").join("tool"));

        let found = find_command_path(osstr("/does/not/matter"), tmp.path(), Path::new("bin/tool"))
            .expect("Expected to find relative 'bin/tool' in cwd");
        assert_eq!(found.as_ref(), tmp.path().join("bin/tool"));
    }

    #[test]
    fn dot_prefix_resolves_against_cwd() {
        let tmp = tempfile::tempdir().expect("tempdir");
        touch_executable(&tmp.path().join("foo"));

        let found = find_command_path(osstr("/bin"), tmp.path(), Path::new("./foo"))
            .expect("Expected to find './foo' in cwd");
        assert!(found.as_ref().ends_with("foo"));
        assert!(found.as_ref().starts_with(tmp.path()));
    }

    #[test]
    fn non_executable_files_and_directories_are_skipped() {
        let tmp = tempfile::tempdir().expect("tempdir");
        File::create(tmp.path().join("plain")).expect("touch");
        fs::create_dir(tmp.path().join("dir")).expect("mkdir");
        let search = tmp.path().as_os_str();

        assert!(find_command_path(search, Path::new("/"), Path::new("plain")).is_none());
        assert!(find_command_path(search, Path::new("/"), Path::new("dir")).is_none());
        assert!(find_command_path(search, tmp.path(), Path::new("./plain")).is_none());
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new("/"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    fn resolve_program_uses_session_path() {
        let mut session = Session::with_parts(HashMap::new(), "/");
        assert_eq!(resolve_program("sh", &session), None);

        session.set_var("PATH", "/bin");
        assert_eq!(resolve_program("sh", &session), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn signal_exit_codes() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        // SIGPIPE
        assert_eq!(exit_code(ExitStatus::from_raw(13)), 141);
    }
}
