use argh::FromArgs;
use pipesh::Interpreter;
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// A minimal UNIX shell: pipelines of external commands plus `cd`.
struct Args {
    #[argh(option, short = 'c')]
    /// run a single line and exit instead of starting the interactive loop.
    command: Option<String>,

    #[argh(switch, short = 'q')]
    /// do not print the greeting.
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let mut shell = Interpreter::default();

    match args.command {
        // Errors are reported, never turned into the shell's exit status.
        Some(line) => {
            shell.handle_line(&line);
        }
        None => shell.repl(!args.quiet)?,
    }
    Ok(())
}
