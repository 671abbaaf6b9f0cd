use num_traits::FromPrimitive;
use rand::RngCore;

mod errors;
mod message_class;
mod message_method;

use crate::definitions::{STUN_HEADER_SIZE, STUN_MAGIC_COOKIE_U32};
use crate::transaction_id::TransactionId;
use crate::view::View;
pub use errors::HeaderDecodeError;
pub use message_class::StunMessageClass;
pub use message_method::StunMessageMethod;

const STUN_CLASS_MASK: u16 = 0b0000_0001_0001_0000;
const STUN_METHOD_MASK: u16 = 0b1111_1110_1110_1111;

#[derive(Debug, Copy, Clone)]
/// [STUN message header](https://tools.ietf.org/html/rfc5389#section-6)
///
/// All STUN messages MUST start with a 20-byte header followed by zero
/// or more Attributes.  The STUN header contains a STUN message type,
/// magic cookie, transaction ID, and message length.
///
/// The most significant 2 bits of every STUN message MUST be zeroes.
/// This can be used to differentiate STUN packets from other protocols
/// when STUN is multiplexed with other protocols on the same port.
///
/// The message type defines the message class (request, success
/// response, failure response, or indication) and the message method
/// (the primary function) of the STUN message.  Although there are four
/// message classes, there are only two types of transactions in STUN:
/// request/response transactions (which consist of a request message and
/// a response message) and indication transactions (which consist of a
/// single indication message).  Response classes are split into error
/// and success responses to aid in quickly processing the STUN message.
pub struct StunHeader {
    /// STUN message class
    pub message_class: StunMessageClass,
    /// STUN message method
    pub message_method: StunMessageMethod,
    /// STUN transaction id (12 bytes, or 16 in RFC3489 legacy mode)
    pub transaction_id: TransactionId,
    /// STUN message length
    /// Only set to a non-zero value when decoding the header
    pub message_len: u16,
    /// Set when the magic cookie is missing/invalid on a Binding
    /// request, per RFC3489 backward compatibility.
    pub is_rfc3489: bool,
}

impl StunHeader {
    /// Creates a new header
    ///
    /// If no `transaction_id` is provided, one is randomly generated and set
    /// The `message_len` is set as zero and left untouched unless a decoder sets it.
    pub(crate) fn new(
        message_method: StunMessageMethod,
        message_class: StunMessageClass,
        transaction_id: Option<TransactionId>,
    ) -> Self {
        let transaction_id = match transaction_id {
            Some(id) => id,
            None => TransactionId::generate(&mut rand::thread_rng()),
        };

        Self {
            message_method,
            message_class,
            transaction_id,
            message_len: 0, // Placeholder for the encoder to later fill in
            is_rfc3489: false,
        }
    }

    pub(crate) fn new_with_rng(
        message_method: StunMessageMethod,
        message_class: StunMessageClass,
        rng: &mut impl RngCore,
    ) -> Self {
        Self {
            message_method,
            message_class,
            transaction_id: TransactionId::generate(rng),
            message_len: 0,
            is_rfc3489: false,
        }
    }

    /// Decodes and returns a STUN message header.
    ///
    /// A request whose magic cookie does not match is treated as an
    /// RFC3489 legacy message: the transaction id is 16 bytes starting
    /// right after the length field and there is no cookie on the wire
    /// at all. Both layouts total 20 bytes, so callers can always start
    /// reading attributes at offset `STUN_HEADER_SIZE`.
    pub(crate) fn decode(view: View<'_>) -> Result<Self, HeaderDecodeError> {
        if view.len() < STUN_HEADER_SIZE {
            return Err(HeaderDecodeError::InsufficientData());
        }

        let stun_type_field = view.assured_read_u16be(0);
        let msg_len = view.assured_read_u16be(2);
        let cookie = view.assured_read_u32be(4);

        let stun_class = stun_type_field & STUN_CLASS_MASK;
        let stun_method = stun_type_field & STUN_METHOD_MASK;

        let message_method: StunMessageMethod = FromPrimitive::from_u16(stun_method)
            .ok_or(HeaderDecodeError::UnrecognizedMessageMethod(stun_method))?;
        let message_class: StunMessageClass = FromPrimitive::from_u16(stun_class)
            .ok_or(HeaderDecodeError::UnrecognizedMessageClass(stun_class))?;

        let cookie_ok = cookie == STUN_MAGIC_COOKIE_U32;
        let is_rfc3489 = !cookie_ok && matches!(message_class, StunMessageClass::Request);
        if !cookie_ok && !is_rfc3489 {
            return Err(HeaderDecodeError::MagicCookieMismatch());
        }

        let transaction_id = if is_rfc3489 {
            TransactionId::from_slice(view.assured_subview(4, 16).data())
        } else {
            TransactionId::from_slice(view.assured_subview(8, 12).data())
        }
        .expect("slice length always matches a valid transaction id length");

        Ok(Self {
            message_method,
            message_class,
            message_len: msg_len,
            transaction_id,
            is_rfc3489,
        })
    }

    /// Encodes itself into the binary representation defined by [RFC5389](https://tools.ietf.org/html/rfc5389).
    ///
    /// Writing to a `Vec` can't fail, so unlike decode this has no
    /// error path.
    pub(crate) fn encode(&self) -> Vec<u8> {
        let stun_type_field = self.message_class as u16 | self.message_method as u16;

        let mut buf = Vec::with_capacity(STUN_HEADER_SIZE);
        buf.extend_from_slice(&stun_type_field.to_be_bytes());
        buf.extend_from_slice(&self.message_len.to_be_bytes());
        if !self.is_rfc3489 {
            buf.extend_from_slice(&STUN_MAGIC_COOKIE_U32.to_be_bytes());
        }
        buf.extend_from_slice(self.transaction_id.as_bytes());

        buf
    }
}
