use thiserror::Error;

use crate::attribute::{AttributeDecodeError, AttributeEncodeError};
use crate::error::CryptoError;
use crate::header::HeaderDecodeError;

/// Message decoding errors.
#[derive(Error, Debug, Clone)]
pub enum MessageDecodeError {
    /// Failure to decode the STUN header section.
    #[error("error decoding STUN header")]
    HeaderDecodeFailure(#[from] HeaderDecodeError),
    /// Failure to decode a STUN attribute's value.
    #[error("error decoding STUN attribute")]
    AttributeDecodeFailure(#[from] AttributeDecodeError),
    /// `msg_length` was not a multiple of 4, or didn't match the
    /// number of bytes actually following the header.
    #[error("invalid message length: header says {message_len}, buffer has {actual} bytes after the header")]
    InvalidMessageLength { message_len: u16, actual: usize },
    /// An attribute's declared length overruns the buffer.
    #[error("attribute at offset {offset} overruns the message buffer")]
    AttributeOverrunsMessage { offset: usize },
    /// FINGERPRINT was present but was not the last attribute.
    #[error("FINGERPRINT attribute is not the last one in the message")]
    FingerprintNotLast(),
    /// The FINGERPRINT value didn't match the recomputed CRC-32.
    #[error("FINGERPRINT mismatch: attribute {attr_value:#010x}, computed {computed_value:#010x}")]
    FingerprintMismatch { attr_value: u32, computed_value: u32 },
}

/// Message encoding errors.
#[derive(Error, Debug, Clone)]
pub enum MessageEncodeError {
    /// Failure to encode a STUN attribute's value.
    #[error("error encoding STUN attribute")]
    AttributeEncodeFailure(#[from] AttributeEncodeError),
    /// MESSAGE-INTEGRITY was requested in the attribute set but no
    /// `IntegrityData` was supplied to `build`.
    #[error("MESSAGE-INTEGRITY attribute present but no integrity data supplied to build")]
    MissingIntegrityData(),
    /// The injected hash function failed while signing the message.
    #[error("hash function failed while computing MESSAGE-INTEGRITY")]
    HashFailure(#[from] CryptoError),
    /// FINGERPRINT was not the last attribute added.
    #[error("FINGERPRINT attribute is not the last one in the message")]
    FingerprintNotLast(),
    /// An attribute was added after MESSAGE-INTEGRITY other than FINGERPRINT.
    #[error("attribute added after MESSAGE-INTEGRITY")]
    AttributeAfterIntegrity(),
}
