//! # duoram
//!
//! A two-server distributed oblivious RAM with a Du–Atallah online
//! inner-product reconstruction, backed by a correlated-randomness pairing
//! server, plus a rotating-key authenticated control channel for driving
//! it. See `SPEC_FULL.md` for the full design.
#![warn(missing_docs)]

pub mod cli;
pub mod control;
pub mod coordinator;
pub mod error;
pub mod pairing;
pub mod party;
pub mod ring;
pub mod wire;
