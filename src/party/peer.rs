//! Peer-facing transport (§4.3, §6): one-shot framed messages between the
//! two party processes, disambiguated by `(session id, tag)` so that many
//! concurrent READ_SECURE requests can share the same listener (testable
//! property 6 / scenario S6).

use std::collections::HashMap;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ring::RingVec;
use crate::wire::{
    read_ring_vec, read_u32_be, read_u64_be, read_u8, write_ring_vec, write_u32_be, write_u64_be,
    write_u8,
};

/// Default time a party waits for a peer message before giving up on a
/// request. The specification does not mandate a value (§5); this is a
/// generous but finite default.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(30);

type Inbox = Mutex<HashMap<(u64, u8), (usize, RingVec)>>;

/// Shared state between the peer accept loop (which fills the inbox) and
/// the request threads (which dial out and drain it).
pub struct PeerLink {
    /// Address to dial when sending a message to the peer party.
    peer_addr: String,
    inbox: Inbox,
    cv: Condvar,
    timeout: Duration,
}

impl PeerLink {
    /// Build a link that dials `peer_addr` to send and expects [`run_peer_listener`]
    /// to be feeding this same instance's inbox for receives.
    pub fn new(peer_addr: String) -> Arc<PeerLink> {
        Arc::new(PeerLink {
            peer_addr,
            inbox: Mutex::new(HashMap::new()),
            cv: Condvar::new(),
            timeout: DEFAULT_PEER_TIMEOUT,
        })
    }

    /// Send a framed peer message: `[u64 sid][u8 tag][u32 dim][dim ring elements]`.
    /// One-shot: dials the peer, writes the frame, and lets the connection close.
    pub fn send(&self, session_id: u64, tag: u8, vec: &RingVec) -> Result<()> {
        let mut stream = TcpStream::connect(&self.peer_addr)?;
        write_u64_be(&mut stream, session_id)?;
        write_u8(&mut stream, tag)?;
        write_u32_be(&mut stream, vec.len() as u32)?;
        write_ring_vec(&mut stream, vec)?;
        use std::io::Write;
        stream.flush()?;
        Ok(())
    }

    /// Block until the peer message tagged `(session_id, tag)` arrives,
    /// rejecting it if its dimension doesn't match `expected_dim`.
    pub fn recv(&self, session_id: u64, tag: u8, expected_dim: usize) -> Result<RingVec> {
        let deadline = Instant::now() + self.timeout;
        let mut guard = self.inbox.lock().expect("peer inbox poisoned");
        loop {
            if let Some((dim, vec)) = guard.remove(&(session_id, tag)) {
                crate::wire::check_dim(expected_dim, dim)?;
                return Ok(vec);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Transport(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("timed out waiting for peer message (sid={session_id}, tag={tag:#x})"),
                )));
            }
            let (g, result) = self
                .cv
                .wait_timeout(guard, deadline - now)
                .expect("peer inbox poisoned");
            guard = g;
            if result.timed_out() {
                return Err(Error::Transport(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("timed out waiting for peer message (sid={session_id}, tag={tag:#x})"),
                )));
            }
        }
    }

    fn deliver(&self, session_id: u64, tag: u8, dim: usize, vec: RingVec) {
        let mut guard = self.inbox.lock().expect("peer inbox poisoned");
        guard.insert((session_id, tag), (dim, vec));
        self.cv.notify_all();
    }
}

/// Run the peer accept loop forever, feeding every received message into
/// `link`'s inbox. Each connection carries exactly one frame.
pub fn run_peer_listener(listener: TcpListener, link: Arc<PeerLink>) {
    for incoming in listener.incoming() {
        let stream = match incoming {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to accept peer connection");
                continue;
            }
        };
        let link = Arc::clone(&link);
        std::thread::spawn(move || {
            if let Err(e) = handle_peer_connection(stream, &link) {
                debug!(error = %e, "peer connection closed with error");
            }
        });
    }
}

fn handle_peer_connection(mut stream: TcpStream, link: &PeerLink) -> Result<()> {
    let session_id = read_u64_be(&mut stream)?;
    let tag = read_u8(&mut stream)?;
    let dim = read_u32_be(&mut stream)? as usize;
    let vec = read_ring_vec(&mut stream, dim)?;
    link.deliver(session_id, tag, dim, vec);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::Ring;
    use std::net::TcpListener;

    #[test]
    fn delivers_and_disambiguates_by_sid_and_tag() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let link = PeerLink::new(addr.clone());
        run_peer_listener_once(listener, Arc::clone(&link));

        // Send to ourselves via the listener we just stood up.
        link.send(7, 0x01, &vec![Ring::new(1), Ring::new(2)])
            .unwrap();
        let got = link.recv(7, 0x01, 2).unwrap();
        assert_eq!(got, vec![Ring::new(1), Ring::new(2)]);
    }

    // Accept exactly one connection then stop, so the test doesn't leak a
    // background thread that outlives the test process.
    fn run_peer_listener_once(listener: TcpListener, link: Arc<PeerLink>) {
        std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                let _ = handle_peer_connection(stream, &link);
            }
        });
        std::thread::sleep(Duration::from_millis(50));
    }
}
