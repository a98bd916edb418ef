//! Shared harness for the black-box integration tests (A4): boots real
//! `TcpListener`s on ephemeral `127.0.0.1:0` ports and wires up a full
//! two-party DUORAM plus its pairing server, the way a deployed system
//! would be wired by the CLI binaries, minus the CLI parsing.

use std::net::TcpListener;
use std::sync::Arc;

use duoram::control::{run_control_server, ControlServerContext, UserTable};
use duoram::pairing::run_pairing_server;
use duoram::party::peer::run_peer_listener;
use duoram::party::{run_client_server, PartyContext, PeerLink, PartyRole, ShareStore};

/// Addresses of a fully wired-up two-party DUORAM deployment.
pub struct Deployment {
    pub pairing_addr: String,
    pub party_a_addr: String,
    pub party_b_addr: String,
}

fn bind_ephemeral() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Boot a pairing server and a pair of parties (each with its own client
/// port, peer port, and all-zero share vector of length `rows`), all on
/// background threads. Returns once every listener is bound, so the
/// returned addresses are immediately connectable.
pub fn spawn_deployment(rows: usize) -> Deployment {
    let (pairing_listener, pairing_addr) = bind_ephemeral();
    std::thread::spawn(move || {
        run_pairing_server(pairing_listener).expect("pairing server crashed");
    });

    let (peer_a_listener, peer_a_addr) = bind_ephemeral();
    let (peer_b_listener, peer_b_addr) = bind_ephemeral();
    let (client_a_listener, client_a_addr) = bind_ephemeral();
    let (client_b_listener, client_b_addr) = bind_ephemeral();

    let link_a = PeerLink::new(peer_b_addr);
    let link_b = PeerLink::new(peer_a_addr);

    {
        let link_a = Arc::clone(&link_a);
        std::thread::spawn(move || run_peer_listener(peer_a_listener, link_a));
    }
    {
        let link_b = Arc::clone(&link_b);
        std::thread::spawn(move || run_peer_listener(peer_b_listener, link_b));
    }

    let ctx_a = Arc::new(PartyContext {
        role: PartyRole::A,
        store: ShareStore::new(rows),
        pairing_addr: pairing_addr.clone(),
        peer: link_a,
    });
    let ctx_b = Arc::new(PartyContext {
        role: PartyRole::B,
        store: ShareStore::new(rows),
        pairing_addr: pairing_addr.clone(),
        peer: link_b,
    });

    std::thread::spawn(move || run_client_server(client_a_listener, ctx_a));
    std::thread::spawn(move || run_client_server(client_b_listener, ctx_b));

    Deployment {
        pairing_addr,
        party_a_addr: client_a_addr,
        party_b_addr: client_b_addr,
    }
}

/// Boot a control server with the given user table on a background
/// thread. Returns its address.
pub fn spawn_control_server(users: UserTable) -> String {
    let (private_key, public_key) =
        duoram::control::crypto::generate_keypair().expect("keygen failed");
    let ctx = Arc::new(ControlServerContext {
        users,
        private_key,
        public_key,
    });
    let (listener, addr) = bind_ephemeral();
    std::thread::spawn(move || run_control_server(listener, ctx));
    addr
}
