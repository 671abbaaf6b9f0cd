use thiserror::Error;

/// Header decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderDecodeError {
    /// The buffer is shorter than a STUN header (20 bytes).
    #[error("insufficient data for STUN header")]
    InsufficientData(),
    /// The magic cookie field received in STUN header doesn't match 0x2112a442,
    /// and the message class is not Request (so RFC3489 legacy mode does not apply).
    #[error("magic cookie mismatch")]
    MagicCookieMismatch(),
    /// Unrecognized message method type value.
    #[error("unrecognized message method type value: {0}")]
    UnrecognizedMessageMethod(u16),
    /// Unrecognized message class type value.
    #[error("unrecognized message class type value: {0}")]
    UnrecognizedMessageClass(u16),
}
