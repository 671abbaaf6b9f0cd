//! The UDP STUN client state machine (RFC 5389/8489 §7.2-7.3; RFC 6298
//! retransmission with Karn's algorithm). See [`ClientUdp`].

mod client;
mod effect;
mod handle;
mod settings;
mod timeline;
mod transaction;

pub use client::{ClientUdp, Request, Statistics};
pub use effect::{Effect, FailureReason, SendData, Sleep, TransactionFailed, TransactionOk};
pub use handle::Handle;
pub use settings::{Auth, Settings};
