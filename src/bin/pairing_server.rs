//! Binary entry point for the correlated-randomness pairing server (C2).

use std::net::TcpListener;

use anyhow::{Context, Result};
use clap::Parser;
use duoram::cli::{init_tracing, PairingServerArgs};
use duoram::pairing::run_pairing_server;

fn main() -> Result<()> {
    init_tracing();
    let args = PairingServerArgs::parse();

    let listener = TcpListener::bind(&args.listen)
        .with_context(|| format!("failed to bind pairing server to {}", args.listen))?;

    run_pairing_server(listener).context("pairing server exited with an error")?;
    Ok(())
}
