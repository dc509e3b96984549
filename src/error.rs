//! Error taxonomy for running one line through the shell.
//!
//! Every error here is recoverable: the read loop prints it to standard error and
//! moves on to the next line.

use crate::command::ExitCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Anything that can go wrong while running a single input line.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The line is not a well-formed pipeline. Nothing was launched.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A builtin rejected its arguments or could not complete.
    #[error(transparent)]
    Builtin(#[from] BuiltinError),

    /// The pipes connecting the stages could not be allocated.
    #[error("failed to allocate pipe: {0}")]
    Pipe(#[source] io::Error),

    /// A stage failed to launch or finished unsuccessfully.
    #[error("{source}")]
    Stage {
        /// Zero-based position of the stage in the pipeline.
        index: usize,
        #[source]
        source: StageError,
    },
}

/// Malformed pipeline syntax.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A stage between (or around) pipe delimiters has no words.
    #[error("syntax error: empty command at stage {position}")]
    EmptyStage { position: usize },
}

/// Failures of commands executed inside the shell process.
#[derive(Debug, Error)]
pub enum BuiltinError {
    /// `cd` without an operand, and no home directory is known.
    #[error("cd: could not get home directory: HOME is not set")]
    HomeDir,

    /// The target directory is missing, not a directory, or not accessible.
    #[error("cd: {}: {}", .path.display(), .source)]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Argument parsing failed; carries the usage message.
    #[error("{0}")]
    Usage(String),
}

/// Failure of a single pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// The stage's process never started.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("{command}: command not found")]
    CommandNotFound { command: String },

    #[error("{command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// The stage's process started but the stage did not finish cleanly.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{command}: exit status {code}")]
    Exited { command: String, code: ExitCode },

    #[error("{command}: failed to wait for process: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Copying the terminal stage's output to the caller failed.
    #[error("{command}: output stream error: {source}")]
    Stream {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command}: stage supervisor panicked")]
    Aborted { command: String },
}

impl StageError {
    pub fn is_command_not_found(&self) -> bool {
        matches!(self, StageError::Launch(LaunchError::CommandNotFound { .. }))
    }
}
