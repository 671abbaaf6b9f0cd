use std::fmt;

use crate::message::{MessageDecodeError, MessageEncodeError};

/// Category + code error, echoing the taxonomy the wire-format and
/// client/server logic are organized around (RFC 5389 parse failures,
/// client-transaction failures, injected hash-provider failures).
/// Callers append human-readable context as the error propagates;
/// `message()` renders the context stack reversed and colon-joined,
/// innermost last, e.g. `"stun message: stun header: invalid magic
/// cookie"`.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    context: Vec<String>,
}

/// The category. Grounded on `original_source/src/stun/stun_error.hpp`,
/// which carries exactly `ParseError` and `ClientError` as
/// `std::error_code` categories for the STUN core, plus
/// `node/openssl/node_openssl_error.hpp`'s separate category for the
/// injected hash provider (generalized here to `CryptoError` since the
/// hash function is swappable, not tied to OpenSSL specifically).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Message parse/build failures, carrying the original decode/encode
/// error rather than a stringified summary so callers matching on
/// `Error::kind()` can still distinguish e.g. a fingerprint mismatch
/// from an invalid message length.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Decode(#[from] MessageDecodeError),
    #[error(transparent)]
    Encode(#[from] MessageEncodeError),
}

/// Per-transaction failure codes, mirroring `stun_error.hpp`'s
/// `ClientError` enum one for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("transaction not found")]
    TransactionNotFound,
    #[error("no integrity attribute in response")]
    NoIntegrityAttributeInResponse,
    #[error("digest is not valid")]
    DigestIsNotValid,
    #[error("no address in response")]
    NoAddressInResponse,
    #[error("no error code in response")]
    NoErrorCodeInResponse,
    #[error("no alternate server in response")]
    NoAlternateServerInResponse,
}

/// Failures from the injected hash/SASLprep boundary. Kept separate
/// from `ParseError`/`ClientError` because it originates outside the
/// STUN core proper (an embedder's hash provider, or `stringprep`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("hash function failed")]
    HashFunctionFailed,
    #[error("SASLprep failed for input password")]
    SaslPrepFailed,
}

impl Error {
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        let kind = kind.into();
        let base = kind.to_string();
        Self {
            kind,
            context: vec![base],
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Appends a layer of context as the error propagates upward.
    pub fn context(mut self, msg: impl Into<String>) -> Self {
        self.context.push(msg.into());
        self
    }

    /// Renders the context stack reversed (outermost first) and
    /// colon-joined.
    pub fn message(&self) -> String {
        self.context
            .iter()
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join(": ")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for Error {}

impl From<MessageDecodeError> for Error {
    fn from(e: MessageDecodeError) -> Self {
        Error::new(ParseError::from(e))
    }
}

impl From<MessageEncodeError> for Error {
    fn from(e: MessageEncodeError) -> Self {
        Error::new(ParseError::from(e))
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Self {
        Error::new(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Adds `.context(msg)` to any `Result<T, Error>`, so each layer of the
/// call stack can narrate where a failure occurred without allocating
/// unless the error path is actually taken.
pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_renders_reversed_and_joined() {
        let err = Error::new(ClientError::TransactionNotFound)
            .context("stun header")
            .context("stun message");
        assert_eq!(
            err.message(),
            "stun message: stun header: transaction not found"
        );
    }

    #[test]
    fn kind_preserves_the_category() {
        let err = Error::new(CryptoError::SaslPrepFailed);
        assert!(matches!(err.kind(), ErrorKind::Crypto(CryptoError::SaslPrepFailed)));
    }
}
