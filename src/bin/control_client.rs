//! Binary entry point for the rotating-key control channel client (C5).

use anyhow::{Context, Result};
use clap::Parser;
use duoram::cli::{init_tracing, ControlClientArgs};
use duoram::control::ControlClient;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let args = ControlClientArgs::parse();

    let mut client = ControlClient::connect(&args.connect, &args.username, &args.password)
        .context("enrollment/authentication failed")?;

    let reply = client
        .send_message(&args.message)
        .context("RK_MSG exchange failed")?;

    info!(%reply, "received reply");
    println!("{reply}");
    Ok(())
}
