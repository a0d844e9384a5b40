//! gox — cross-compile Go applications for many platforms in parallel.

mod args;
mod build;
mod config;

use std::process;

use tracing_subscriber::EnvFilter;

use args::Cli;

fn main() {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            process::exit(1);
        }
        // --help and --version
        Err(e) => e.exit(),
    };

    init_logging(cli.verbose.unwrap_or(false));

    let code = match run(&cli) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    };
    process::exit(code);
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let cwd = std::env::current_dir()?;
    build::run(cli, &cwd)
}

/// Logs go to stderr so stdout carries only build progress.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
