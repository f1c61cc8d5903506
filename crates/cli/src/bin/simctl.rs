//! simctl: control a local blockchain simulator.

use anyhow::Context;
use clap::Parser;
use simctl_cli::{run, Cli, Environment};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay clean.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let env = Environment::production();
    let mut stdout = std::io::stdout();
    let code = run(cli, &env, &mut stdout)
        .await
        .context("failed to write output")?;
    Ok(ExitCode::from(code))
}
