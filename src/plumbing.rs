//! Pipe allocation and stdio binding for pipeline stages.

use std::io::{self, PipeReader, PipeWriter};
use std::process::Stdio;
use tracing::debug;

/// Where a stage reads its standard input from.
#[derive(Debug)]
pub(crate) enum StageInput {
    /// The shell's own standard input.
    Inherit,
    /// Read side of the pipe fed by the previous stage.
    Pipe(PipeReader),
}

/// Where a stage writes its standard output to.
#[derive(Debug)]
pub(crate) enum StageOutput {
    /// The shell's own standard output.
    Inherit,
    /// Write side of the pipe feeding the next stage, or the capture pipe.
    Pipe(PipeWriter),
}

impl From<StageInput> for Stdio {
    fn from(input: StageInput) -> Self {
        match input {
            StageInput::Inherit => Stdio::inherit(),
            StageInput::Pipe(reader) => reader.into(),
        }
    }
}

impl From<StageOutput> for Stdio {
    fn from(output: StageOutput) -> Self {
        match output {
            StageOutput::Inherit => Stdio::inherit(),
            StageOutput::Pipe(writer) => writer.into(),
        }
    }
}

/// Endpoints owned by one stage. Standard error is always inherited.
#[derive(Debug)]
pub(crate) struct StageIo {
    pub stdin: StageInput,
    pub stdout: StageOutput,
}

impl StageIo {
    /// Close this process's copies of the stage's endpoints.
    ///
    /// Closing the write side is what lets the next stage observe end-of-stream.
    pub fn release(self) {
        drop(self.stdin);
        drop(self.stdout);
    }
}

/// Stdio endpoints for every stage of a pipeline, in pipeline order.
#[derive(Debug)]
pub(crate) struct Plumbing {
    pub stages: Vec<StageIo>,
    /// Read side of the terminal stage's stdout, when output is captured.
    pub capture: Option<PipeReader>,
}

/// Allocate `stage_count - 1` pipes and bind each stage's endpoints.
///
/// Stage `i` writes into pipe `i`, stage `i + 1` reads from it. The first stage keeps
/// the shell's stdin; the last keeps the shell's stdout unless `capture` is set, in
/// which case one more pipe is allocated for it.
pub(crate) fn connect(stage_count: usize, capture: bool) -> io::Result<Plumbing> {
    let mut stages = Vec::with_capacity(stage_count);
    let mut next_stdin = StageInput::Inherit;

    for index in 0..stage_count {
        let stdin = std::mem::replace(&mut next_stdin, StageInput::Inherit);
        let stdout = if index + 1 < stage_count {
            let (reader, writer) = io::pipe()?;
            next_stdin = StageInput::Pipe(reader);
            StageOutput::Pipe(writer)
        } else {
            StageOutput::Inherit
        };
        stages.push(StageIo { stdin, stdout });
    }

    let capture = match (capture, stages.last_mut()) {
        (true, Some(last)) => {
            let (reader, writer) = io::pipe()?;
            last.stdout = StageOutput::Pipe(writer);
            Some(reader)
        }
        _ => None,
    };

    debug!(
        stages = stage_count,
        pipes = stage_count.saturating_sub(1),
        captured = capture.is_some(),
        "pipeline plumbing connected"
    );
    Ok(Plumbing { stages, capture })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn single_stage_uses_shell_streams() {
        let plumbing = connect(1, false).unwrap();
        assert_eq!(plumbing.stages.len(), 1);
        assert!(matches!(plumbing.stages[0].stdin, StageInput::Inherit));
        assert!(matches!(plumbing.stages[0].stdout, StageOutput::Inherit));
        assert!(plumbing.capture.is_none());
    }

    #[test]
    fn adjacent_stages_share_a_pipe() {
        let plumbing = connect(3, false).unwrap();
        let stages = &plumbing.stages;
        assert_eq!(stages.len(), 3);

        assert!(matches!(stages[0].stdin, StageInput::Inherit));
        assert!(matches!(stages[0].stdout, StageOutput::Pipe(_)));
        assert!(matches!(stages[1].stdin, StageInput::Pipe(_)));
        assert!(matches!(stages[1].stdout, StageOutput::Pipe(_)));
        assert!(matches!(stages[2].stdin, StageInput::Pipe(_)));
        assert!(matches!(stages[2].stdout, StageOutput::Inherit));
    }

    #[test]
    fn bytes_flow_from_writer_to_next_reader() {
        let mut plumbing = connect(2, false).unwrap();
        let consumer = plumbing.stages.pop().unwrap();
        let producer = plumbing.stages.pop().unwrap();

        let StageOutput::Pipe(mut writer) = producer.stdout else {
            panic!("producer should write into a pipe");
        };
        let StageInput::Pipe(mut reader) = consumer.stdin else {
            panic!("consumer should read from a pipe");
        };

        writer.write_all(b"hello").unwrap();
        drop(writer);

        let mut buf = String::new();
        reader.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "hello");
    }

    #[test]
    fn releasing_the_writer_signals_end_of_stream() {
        let mut plumbing = connect(2, false).unwrap();
        let consumer = plumbing.stages.pop().unwrap();
        let producer = plumbing.stages.pop().unwrap();
        producer.release();

        let StageInput::Pipe(mut reader) = consumer.stdin else {
            panic!("consumer should read from a pipe");
        };
        let mut buf = Vec::new();
        assert_eq!(reader.read_to_end(&mut buf).unwrap(), 0);
    }

    #[test]
    fn capture_rebinds_the_terminal_stdout() {
        let mut plumbing = connect(2, true).unwrap();
        let mut capture = plumbing.capture.take().expect("capture reader");
        let last = plumbing.stages.pop().unwrap();

        let StageOutput::Pipe(mut writer) = last.stdout else {
            panic!("terminal stage should write into the capture pipe");
        };
        writer.write_all(b"captured").unwrap();
        drop(writer);
        drop(plumbing);

        let mut buf = String::new();
        capture.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "captured");
    }
}
