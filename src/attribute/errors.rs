use thiserror::Error;

/// Attribute decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeDecodeError {
    /// Not enough data was provided to decode the value.
    #[error("not enough data to decode attribute value")]
    InsufficientData(),
    /// Failed to convert byte sequence into a UTF-8 string.
    #[error("attribute value is not valid UTF-8")]
    InvalidString(),
    /// Unrecognized field value was provided (e.g. an address family byte).
    #[error("invalid field value: {0}")]
    InvalidValue(u128),
}

/// Attribute encoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeEncodeError {
    /// The encoded UTF-8 value crosses the size limit for the field.
    /// REALM, SOFTWARE, reason phrases, and NONCE are limited to 127
    /// characters (763 bytes); USERNAME to 513 bytes.
    #[error("utf-8 value too big: limit {limit}, got {length}")]
    Utf8ValueTooBig {
        /// The size limit specified in the RFC.
        limit: usize,
        /// The current length of the encoded value.
        length: usize,
    },
}
