//! Small types shared by the builtin and pipeline paths.

use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Processes killed by a signal are reported as `128 + signal`, as POSIX shells do.
pub type ExitCode = i32;

/// Destination of the terminal stage's standard output.
pub enum Output<'a> {
    /// Write straight to the shell's own standard output.
    Inherit,
    /// Stream into the given writer; the terminal stage writes to a pipe that the
    /// coordinator drains concurrently.
    Capture(&'a mut (dyn Write + Send)),
}

impl Output<'_> {
    pub(crate) fn is_captured(&self) -> bool {
        matches!(self, Output::Capture(_))
    }
}
