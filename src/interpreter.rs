//! Running input lines against a session, and the interactive read loop.

use crate::builtin;
use crate::command::Output;
use crate::coordinator;
use crate::error::ShellError;
use crate::parser;
use crate::prompt::Prompt;
use crate::session::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io;
use tracing::{debug, warn};

/// Literal line that ends the interactive loop.
pub const QUIT_COMMAND: &str = "\\quit";

/// Printed once when the interactive loop starts.
pub const GREETING: &str = "Simple UNIX Shell. Type \\quit to exit.";

/// What the read loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A minimal shell that runs pipelines of external commands.
///
/// The interpreter owns the [`Session`]; each call to [`Interpreter::execute`] runs
/// one line: parse it, let the builtin dispatcher claim it, or connect and run its
/// stages concurrently.
///
/// Example
/// ```
/// use pipesh::Interpreter;
/// use pipesh::command::Output;
///
/// let mut sh = Interpreter::default();
/// let mut out: Vec<u8> = Vec::new();
/// sh.execute_with_output("printf hello | tr a-z A-Z", Output::Capture(&mut out)).unwrap();
/// assert_eq!(out, b"HELLO");
/// ```
pub struct Interpreter {
    session: Session,
}

impl Interpreter {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one trimmed line with the terminal stage writing to the shell's stdout.
    pub fn execute(&mut self, line: &str) -> Result<(), ShellError> {
        self.execute_with_output(line, Output::Inherit)
    }

    /// Run one trimmed line, sending the terminal stage's stdout to `output`.
    ///
    /// Builtin usage text goes to the same destination.
    pub fn execute_with_output(
        &mut self,
        line: &str,
        mut output: Output<'_>,
    ) -> Result<(), ShellError> {
        let pipeline = parser::parse_pipeline(line)?;
        debug!(stages = pipeline.len(), "parsed line");

        let dispatched = match &mut output {
            Output::Inherit => {
                builtin::dispatch(&pipeline, &mut self.session, &mut io::stdout())
            }
            Output::Capture(writer) => {
                builtin::dispatch(&pipeline, &mut self.session, &mut **writer)
            }
        };
        if let Some(result) = dispatched {
            return result.map_err(ShellError::from);
        }

        coordinator::run(&pipeline, &self.session, output)?.into_result()
    }

    /// Handle one raw line as read from the terminal.
    ///
    /// Errors are reported on stderr and never end the loop; only [`QUIT_COMMAND`] does.
    pub fn handle_line(&mut self, raw: &str) -> Flow {
        let line = raw.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        if line == QUIT_COMMAND {
            return Flow::Quit;
        }
        if let Err(err) = self.execute(line) {
            eprintln!("{err}");
        }
        Flow::Continue
    }

    /// Interactive Read-Eval-Print Loop.
    ///
    /// Ends on [`QUIT_COMMAND`] or end of input. An interrupt discards the line being
    /// typed and shows a fresh prompt. A read error is logged and the prompt is shown
    /// again, unless reads keep failing.
    pub fn repl(&mut self, greet: bool) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let prompt = Prompt::detect(&self.session);
        if greet {
            println!("{GREETING}");
        }

        let mut read_failures = ReadFailures::default();
        loop {
            println!("{}", prompt.header(&self.session));
            match rl.readline(&prompt.input()) {
                Ok(line) => {
                    if self.handle_line(&line) == Flow::Quit {
                        println!("Exiting shell.");
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    read_failures.record(err)?;
                    continue;
                }
            }
            read_failures.reset();
        }

        Ok(())
    }
}

/// Consecutive read errors tolerated before the loop gives up.
const MAX_READ_FAILURES: usize = 3;

/// Tracks read errors in a row so a broken terminal cannot spin the loop forever.
#[derive(Debug, Default)]
struct ReadFailures {
    in_a_row: usize,
}

impl ReadFailures {
    /// Report `err` and decide whether the loop may keep reading.
    fn record(&mut self, err: ReadlineError) -> rustyline::Result<()> {
        self.in_a_row += 1;
        if self.in_a_row >= MAX_READ_FAILURES {
            return Err(err);
        }
        warn!(error = %err, attempt = self.in_a_row, "failed to read line");
        Ok(())
    }

    fn reset(&mut self) {
        self.in_a_row = 0;
    }
}

impl Default for Interpreter {
    /// Create an interpreter over the current process environment and directory.
    fn default() -> Self {
        Self::new(Session::new())
    }
}
