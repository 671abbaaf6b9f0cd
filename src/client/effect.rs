use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use crate::error::Error;
use crate::message::Message;

use super::handle::Handle;

/// Bytes to transmit to the transaction's `path.target`. Shares the
/// transaction's own buffer via `Rc` rather than borrowing it: the
/// client state machine owns its transaction table and an effect queue
/// side by side, so a borrow would need to outlive mutations the queue
/// itself triggers. `Rc` gets the same "don't copy on every retransmit"
/// property without a lifetime tying the effect to the client.
#[derive(Debug, Clone)]
pub struct SendData {
    pub handle: Handle,
    pub bytes: Rc<Vec<u8>>,
}

/// A transaction completed successfully (RFC 5389 §7.3.3).
#[derive(Debug, Clone)]
pub struct TransactionOk {
    pub handle: Handle,
    /// The reflexive transport address the server observed.
    pub endpoint: SocketAddr,
    pub response: Message,
    /// `None` when the success was matched to a retransmitted request
    /// and so cannot be attributed to one send (Karn's algorithm).
    pub round_trip: Option<Duration>,
}

/// Why a transaction ended without success (RFC 5389 §7.3.4 plus the
/// retransmit timeout and ALTERNATE-SERVER cases).
#[derive(Debug, Clone)]
pub enum FailureReason {
    /// The response carried comprehension-required attributes this
    /// crate doesn't recognize.
    UnknownComprehensionRequiredAttribute { attrs: Vec<u16> },
    /// A 420 (Unknown Attribute) error whose UNKNOWN-ATTRIBUTES list
    /// was present and is surfaced directly.
    UnknownAttributeReported { attrs: Vec<u16> },
    /// A 300 (Try Alternate) response named a different server to try.
    AlternateServer { server: SocketAddr },
    /// Any other non-2xx ERROR-CODE.
    ErrorCode { class: u8, number: u8, reason: String },
    /// An internal error (hash failure, malformed alternate-server
    /// response, missing ERROR-CODE).
    Error(Error),
    /// The retransmit budget was exhausted with no response.
    Timeout,
}

#[derive(Debug, Clone)]
pub struct TransactionFailed {
    pub handle: Handle,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Copy)]
pub struct Sleep {
    pub sleep: Duration,
}

/// Every effect the client's step function can surface to the driver.
/// Mirrors `std::variant<SendData, TransactionOk, TransactionFailed,
/// Sleep, Idle>` from the original's `stun_client_udp_effects.hpp`.
#[derive(Debug, Clone)]
pub enum Effect {
    SendData(SendData),
    TransactionOk(TransactionOk),
    TransactionFailed(TransactionFailed),
    Sleep(Sleep),
    Idle,
}

impl Effect {
    /// The effects that end a transaction, `TransactionOk` and
    /// `TransactionFailed`, are where the client removes bookkeeping
    /// for the handle; this reports which handle (if any) just
    /// terminated so `next` can clean up right after dequeuing.
    pub(crate) fn terminal_handle(&self) -> Option<Handle> {
        match self {
            Effect::TransactionOk(ok) => Some(ok.handle),
            Effect::TransactionFailed(failed) => Some(failed.handle),
            _ => None,
        }
    }
}
