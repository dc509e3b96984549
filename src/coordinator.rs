//! Concurrent execution of a connected pipeline.
//!
//! Every stage is supervised by its own scoped thread: resolve the program, spawn it
//! with the stage's endpoints, close this process's copies of those endpoints, wait
//! for the child. The scope is the completion barrier; nothing returns until every
//! stage has reached a terminal state.

use crate::command::{ExitCode, Output};
use crate::error::{LaunchError, RuntimeError, ShellError, StageError};
use crate::external::{exit_code, resolve_program};
use crate::parser::{Pipeline, Stage};
use crate::plumbing::{self, StageIo};
use crate::session::Session;
use std::io::{self, PipeReader, Write};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Terminal state of one stage.
#[derive(Debug)]
pub struct StageReport {
    pub index: usize,
    pub command: String,
    /// Exit code of a successful stage, or why the stage failed.
    pub result: Result<ExitCode, StageError>,
}

impl StageReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Reports of every stage, in pipeline order regardless of completion order.
#[derive(Debug)]
pub struct PipelineOutcome {
    reports: Vec<StageReport>,
}

impl PipelineOutcome {
    pub fn reports(&self) -> &[StageReport] {
        &self.reports
    }

    pub fn succeeded(&self) -> bool {
        self.reports.iter().all(StageReport::succeeded)
    }

    /// Reduce to the first failure in pipeline order, if any.
    pub fn into_result(self) -> Result<(), ShellError> {
        match self.reports.into_iter().find_map(|report| {
            report
                .result
                .err()
                .map(|source| (report.index, source))
        }) {
            Some((index, source)) => Err(ShellError::Stage { index, source }),
            None => Ok(()),
        }
    }
}

/// Launch every stage of `pipeline` concurrently and wait for all of them.
///
/// A failing stage never cancels its siblings: each one runs to its own natural
/// completion, and its endpoints are closed on every path so neighbours see
/// end-of-stream instead of blocking.
pub fn run(
    pipeline: &Pipeline,
    session: &Session,
    output: Output<'_>,
) -> Result<PipelineOutcome, ShellError> {
    let plumbing =
        plumbing::connect(pipeline.len(), output.is_captured()).map_err(ShellError::Pipe)?;
    let sink = match output {
        Output::Inherit => None,
        Output::Capture(writer) => Some(writer),
    };

    let (mut reports, copied) = thread::scope(|scope| {
        let handles: Vec<_> = pipeline
            .stages()
            .iter()
            .zip(plumbing.stages)
            .map(|(stage, io)| (stage, scope.spawn(move || supervise(stage, io, session))))
            .collect();

        let pump = match (plumbing.capture, sink) {
            (Some(reader), Some(writer)) => Some(scope.spawn(move || drain(reader, writer))),
            _ => None,
        };

        let reports: Vec<StageReport> = handles
            .into_iter()
            .map(|(stage, handle)| StageReport {
                index: stage.index(),
                command: stage.program().to_owned(),
                result: handle.join().unwrap_or_else(|_| {
                    Err(RuntimeError::Aborted {
                        command: stage.program().to_owned(),
                    }
                    .into())
                }),
            })
            .collect();

        let copied = pump.map(|pump| {
            pump.join()
                .unwrap_or_else(|_| Err(io::Error::other("output pump panicked")))
        });
        (reports, copied)
    });

    if let Some(Err(source)) = copied {
        // A stream failure only surfaces if the terminal stage otherwise succeeded.
        if let Some(last) = reports.last_mut().filter(|last| last.succeeded()) {
            last.result = Err(RuntimeError::Stream {
                command: last.command.clone(),
                source,
            }
            .into());
        }
    }

    Ok(PipelineOutcome { reports })
}

/// Unit of work for one stage: launch, release endpoints, wait.
fn supervise(stage: &Stage, io: StageIo, session: &Session) -> Result<ExitCode, StageError> {
    let command = stage.program();

    let Some(program) = resolve_program(command, session) else {
        io.release();
        debug!(stage = stage.index(), command, "command not found");
        return Err(LaunchError::CommandNotFound {
            command: command.to_owned(),
        }
        .into());
    };

    let mut process = Command::new(&program);
    // Children see the stage's own first word as argv[0], not the resolved path.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        process.arg0(command);
    }
    process
        .args(stage.args())
        .env_clear()
        .envs(session.vars())
        .env("PWD", session.current_dir())
        .current_dir(session.current_dir())
        .stdin(Stdio::from(io.stdin))
        .stdout(Stdio::from(io.stdout))
        .stderr(Stdio::inherit());

    let spawned = process.spawn();
    // `process` owns this process's copies of the stage's pipe endpoints. Close them
    // now, whether or not the spawn worked; the child holds its own duplicates.
    drop(process);

    let mut child = spawned.map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LaunchError::CommandNotFound {
            command: command.to_owned(),
        },
        _ => LaunchError::Spawn {
            command: command.to_owned(),
            source,
        },
    })?;
    debug!(stage = stage.index(), command, pid = child.id(), program = %program.display(), "launched");

    let status = child.wait().map_err(|source| RuntimeError::Wait {
        command: command.to_owned(),
        source,
    })?;
    let code = exit_code(status);
    debug!(stage = stage.index(), command, code, "exited");

    if status.success() {
        Ok(code)
    } else {
        Err(RuntimeError::Exited {
            command: command.to_owned(),
            code,
        }
        .into())
    }
}

/// Copy the captured terminal output into the caller's writer until end-of-stream.
fn drain(mut reader: PipeReader, writer: &mut (dyn Write + Send)) -> io::Result<u64> {
    let copied = io::copy(&mut reader, writer)?;
    writer.flush()?;
    Ok(copied)
}
