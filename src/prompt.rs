//! The two-line interactive prompt.

use crate::session::Session;
use std::path::Path;
use tracing::warn;

/// Prompt text shown before each line is read.
///
/// Layout:
/// ```text
///
/// /<last component of the session directory>
/// <user>@<host> ~ $
/// ```
#[derive(Debug, Clone)]
pub struct Prompt {
    user: String,
    host: String,
}

impl Prompt {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
        }
    }

    /// Look up the user and host names once, at start-up.
    pub fn detect(session: &Session) -> Self {
        let user = ["USER", "LOGNAME"]
            .iter()
            .find_map(|key| session.get_var(key).filter(|v| !v.is_empty()))
            .map(last_account_segment)
            .unwrap_or_else(|| {
                warn!("could not determine user name");
                "user".to_string()
            });
        let host = host_name()
            .or_else(|| session.get_var("HOSTNAME").map(str::to_owned))
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| {
                warn!("could not determine host name");
                "localhost".to_string()
            });
        Self::new(user, host)
    }

    /// Lines printed above the input line; they change with the session directory.
    pub fn header(&self, session: &Session) -> String {
        format!("\n{}", directory_label(session.current_dir()))
    }

    /// Text shown on the input line itself.
    pub fn input(&self) -> String {
        format!("{}@{} ~ $ ", self.user, self.host)
    }
}

/// `/name` for the last component of `dir`, or `/` at the filesystem root.
fn directory_label(dir: &Path) -> String {
    match dir.file_name() {
        Some(name) => format!("/{}", name.to_string_lossy()),
        None => "/".to_string(),
    }
}

// Account names such as `DOMAIN\user` are shortened to `user`.
fn last_account_segment(name: &str) -> String {
    name.rsplit('\\').next().unwrap_or(name).to_string()
}

#[cfg(unix)]
fn host_name() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes for the whole call.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

#[cfg(not(unix))]
fn host_name() -> Option<String> {
    None
}
