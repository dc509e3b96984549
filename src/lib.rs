//! A minimal interactive shell built around a concurrent pipeline engine.
//!
//! One input line such as `ls | sort -r | grep go` is split into stages, each stage
//! is launched as an external process with its stdin/stdout bound to the pipes
//! between neighbours, and all stages run at the same time. The only builtin is
//! `cd`, which changes the [`Session`] directory instead of spawning anything.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`],
//! [`error`] and [`session`] expose the types needed to embed it.

mod builtin;
pub mod command;
pub mod coordinator;
pub mod error;
pub mod external;
mod interpreter;
pub mod parser;
mod plumbing;
pub mod prompt;
pub mod session;

pub use error::ShellError;
pub use interpreter::{Flow, GREETING, Interpreter, QUIT_COMMAND};
pub use session::Session;
