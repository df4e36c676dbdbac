//! ws-utility-client: interactive multi-connection WebSocket client.
//!
//! Parses flags, installs logging on stderr, and runs the command shell on
//! stdin/stdout. Leaving the shell closes every open connection and joins
//! the I/O thread.

use std::io;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ws_utility_client::cli::Cli;
use ws_utility_client::{Error, Result, Shell};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    debug!(?cli, "Parsed CLI arguments");

    let registry = cli.registry_builder().build()?;

    let stdin = io::stdin().lock();
    let mut shell = Shell::new(&registry, stdin, io::stdout().lock());

    for uri in &cli.connect {
        shell.execute(ws_utility_client::Command::Connect { uri: uri.clone() })?;
    }

    shell.run()?;
    drop(shell);

    let report = registry.shutdown();
    info!(
        closed = report.closed.len(),
        errors = report.errors.len(),
        "Exiting"
    );

    Ok(())
}

/// Logs to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialize logging: {e}")))
}
