//! Binary entry point for a DUORAM party node (C3).

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use duoram::cli::{init_tracing, PartyArgs};
use duoram::party::peer::run_peer_listener;
use duoram::party::{run_client_server, PartyContext, PeerLink, ShareStore};

fn main() -> Result<()> {
    init_tracing();
    let args = PartyArgs::parse();

    let client_listener = TcpListener::bind(&args.listen)
        .with_context(|| format!("failed to bind client-facing port on {}", args.listen))?;
    let peer_listener = TcpListener::bind(&args.peer_listen)
        .with_context(|| format!("failed to bind peer-facing port on {}", args.peer_listen))?;

    let peer = PeerLink::new(args.peer.clone());
    {
        let peer = Arc::clone(&peer);
        std::thread::spawn(move || run_peer_listener(peer_listener, peer));
    }

    let ctx = Arc::new(PartyContext {
        role: args.role.into(),
        store: ShareStore::new(args.rows),
        pairing_addr: args.share,
        peer,
    });

    run_client_server(client_listener, ctx);
    Ok(())
}
