//! Binary entry point for the rotating-key control channel server (C5).

use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use duoram::cli::{init_tracing, parse_user_table, ControlServerArgs};
use duoram::control::{keys, run_control_server, ControlServerContext};

fn main() -> Result<()> {
    init_tracing();
    let args = ControlServerArgs::parse();

    let users = parse_user_table(&args.user).context("invalid --user entry")?;
    let (private_key, public_key) = keys::load_or_generate(Path::new(&args.keys_dir))
        .with_context(|| format!("failed to load or generate RSA keys in {}", args.keys_dir))?;

    let listener = TcpListener::bind(&args.listen)
        .with_context(|| format!("failed to bind control server to {}", args.listen))?;

    let ctx = Arc::new(ControlServerContext {
        users,
        private_key,
        public_key,
    });
    run_control_server(listener, ctx);
    Ok(())
}
