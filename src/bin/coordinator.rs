//! Binary entry point for the DUORAM coordinator (C4).

use anyhow::{bail, Context, Result};
use clap::Parser;
use duoram::cli::{init_tracing, CoordOp, CoordinatorArgs};
use duoram::coordinator;
use duoram::ring::Ring;
use tracing::{error, info};

fn main() {
    init_tracing();
    if let Err(e) = run() {
        error!(error = %e, "coordinator request failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CoordinatorArgs::parse();

    match args.op {
        CoordOp::Read => {
            let value = coordinator::read(&args.c0, &args.c1, args.dim, args.idx)
                .context("read request failed")?;
            info!(idx = args.idx, dim = args.dim, value = value.value(), "read complete");
            println!("{}", value.value());
        }
        CoordOp::Write => {
            let Some(val) = args.val else {
                bail!("--val is required for --op write");
            };
            coordinator::write(&args.c0, &args.c1, args.dim, args.idx, Ring::new(val))
                .context("write request failed")?;
            info!(idx = args.idx, dim = args.dim, val, "write complete");
            println!("OK");
        }
    }

    Ok(())
}
