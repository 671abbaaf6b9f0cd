//! A STUN (RFC 5389/8489) message codec, stateless server, and UDP
//! client state machine.
//!
//! The wire format lives in [`message`] (built on [`header`] and
//! [`attribute`]); [`server::Stateless`] answers Binding requests
//! without keeping any transaction state; [`client::ClientUdp`] drives
//! the RFC 8489 §6 retransmission schedule (RFC 6298 RTO estimation
//! with Karn's algorithm) as an I/O-free, effect-returning state
//! machine so callers can plug in whatever socket/timer implementation
//! they already have.
//!
//! None of these types perform I/O: a caller supplies the current time
//! and raw bytes at every entry point, and gets back data to send or an
//! outcome to act on. That keeps the whole crate deterministic and
//! testable without a network.

pub mod attribute;
pub mod client;
pub mod clock;
pub mod crypto;
pub mod definitions;
pub mod error;
pub mod header;
pub mod message;
pub mod password;
pub mod path;
pub mod retransmit;
pub mod rto;
pub mod server;
pub mod transaction_id;
pub mod utils;
pub mod view;

pub use error::{Error, Result};
