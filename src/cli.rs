//! Command-line argument structs for this crate's five binaries (§6 "CLI
//! surface"). One `clap`-derived struct per binary, mirroring the way the
//! preprocessed-MPSI protocol this crate grew out of gathers its own
//! argument structs in a single module.

use std::fmt::Display;

use clap::{Parser, ValueEnum};

use crate::control::keys::default_keys_dir;
use crate::party::PartyRole;

/// `pairing_server --listen HOST:PORT`
#[derive(Parser, Debug)]
#[command(version, about = "Correlated-randomness pairing server", long_about = None)]
pub struct PairingServerArgs {
    /// Address to accept triple requests on.
    #[arg(long, default_value = "127.0.0.1:9000")]
    pub listen: String,
}

/// Which party this process plays. Mirrors [`PartyRole`] for `clap`'s sake.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    /// Party A.
    A,
    /// Party B.
    B,
}

impl Display for RoleArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleArg::A => write!(f, "A"),
            RoleArg::B => write!(f, "B"),
        }
    }
}

impl From<RoleArg> for PartyRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::A => PartyRole::A,
            RoleArg::B => PartyRole::B,
        }
    }
}

/// `party --role {A|B} --rows N --listen H:P --peer-listen H:P --peer H:P --share H:P`
#[derive(Parser, Debug)]
#[command(version, about = "Two-server DUORAM party node", long_about = None)]
pub struct PartyArgs {
    /// Which party this process plays.
    #[arg(long, value_enum)]
    pub role: RoleArg,

    /// Dimension of the logical database this party holds a share of.
    #[arg(long)]
    pub rows: usize,

    /// Address to accept client (coordinator) connections on.
    #[arg(long, default_value = "127.0.0.1:9100")]
    pub listen: String,

    /// Address to accept peer-party connections on.
    #[arg(long = "peer-listen", default_value = "127.0.0.1:9200")]
    pub peer_listen: String,

    /// Address of the peer party's `--peer-listen` port.
    #[arg(long)]
    pub peer: String,

    /// Address of the pairing server to fetch triples from.
    #[arg(long)]
    pub share: String,
}

/// Which logical operation the coordinator issues.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CoordOp {
    /// Read the value at `--idx`.
    Read,
    /// Write `--val` at `--idx`.
    Write,
}

impl Display for CoordOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordOp::Read => write!(f, "read"),
            CoordOp::Write => write!(f, "write"),
        }
    }
}

/// `coordinator --op {read|write} --dim N --idx I [--val V] --c0 H:P --c1 H:P`
#[derive(Parser, Debug)]
#[command(version, about = "DUORAM coordinator", long_about = None)]
pub struct CoordinatorArgs {
    /// Which operation to perform.
    #[arg(long, value_enum, default_value_t = CoordOp::Read)]
    pub op: CoordOp,

    /// Dimension of the logical database.
    #[arg(long)]
    pub dim: usize,

    /// Index to read or write.
    #[arg(long)]
    pub idx: usize,

    /// Value to write. Required when `--op write`.
    #[arg(long)]
    pub val: Option<u32>,

    /// Party A's client-facing address.
    #[arg(long)]
    pub c0: String,

    /// Party B's client-facing address.
    #[arg(long)]
    pub c1: String,
}

/// `control_server --listen H:P [--user NAME:PASSWORD ...]`
#[derive(Parser, Debug)]
#[command(version, about = "Rotating-key control channel server", long_about = None)]
pub struct ControlServerArgs {
    /// Address to accept control connections on.
    #[arg(long, default_value = "127.0.0.1:9300")]
    pub listen: String,

    /// A `username:password` pair to enroll at startup. Repeatable. If
    /// none are given, a single demo user is enrolled so the binary is
    /// runnable out of the box (§4.5 "Demo users").
    #[arg(long = "user")]
    pub user: Vec<String>,

    /// Directory holding (or to create) `private.pem`/`public.pem`.
    #[arg(long, default_value_t = default_keys_dir().display().to_string())]
    pub keys_dir: String,
}

/// `control_client --connect H:P --username NAME --password PASS [--message TEXT]`
#[derive(Parser, Debug)]
#[command(version, about = "Rotating-key control channel client", long_about = None)]
pub struct ControlClientArgs {
    /// Address of the control server.
    #[arg(long)]
    pub connect: String,

    /// Username to enroll and authenticate with.
    #[arg(long)]
    pub username: String,

    /// Password to enroll and authenticate with.
    #[arg(long)]
    pub password: String,

    /// Application payload to send once authenticated.
    #[arg(long, default_value = "hello")]
    pub message: String,
}

/// Parse a repeated `--user NAME:PASSWORD` flag into the control server's
/// in-memory user table. Falls back to a single demo account when `users`
/// is empty, so `control_server` is runnable with no flags at all.
pub fn parse_user_table(
    users: &[String],
) -> crate::error::Result<crate::control::UserTable> {
    use crate::control::crypto::hash_password;

    let mut table = crate::control::UserTable::new();
    if users.is_empty() {
        table.insert(
            "alice".to_string(),
            hash_password("correct horse battery staple"),
        );
        return Ok(table);
    }

    for entry in users {
        let (name, password) = entry.split_once(':').ok_or_else(|| {
            crate::error::Error::ProtocolFormat(format!(
                "--user entries must be NAME:PASSWORD, got {entry:?}"
            ))
        })?;
        table.insert(name.to_string(), hash_password(password));
    }
    Ok(table)
}

/// Install a `tracing-subscriber` `fmt` layer driven by `RUST_LOG` (or
/// `info` if unset), the way every binary in this crate starts up (A1).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
