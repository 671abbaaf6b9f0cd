use std::hash::{Hash, Hasher};

use rand::RngCore;

pub const LEN_RFC5389: usize = 12;
pub const LEN_RFC3489: usize = 16;

/// Opaque value correlating a request with its response: 96 bits for
/// modern (RFC 5389/8489) messages, 128 bits when an RFC 3489 legacy
/// request is detected (missing/invalid magic cookie).
///
/// Stored inline as a fixed 16-byte buffer with an explicit length tag
/// rather than a `Vec`, since a transaction id is copied constantly
/// (it keys the client's transaction table) and never grows.
#[derive(Debug, Clone, Copy, Eq)]
pub struct TransactionId {
    bytes: [u8; LEN_RFC3489],
    len: u8,
}

impl TransactionId {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != LEN_RFC5389 && bytes.len() != LEN_RFC3489 {
            return None;
        }
        let mut buf = [0u8; LEN_RFC3489];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn is_rfc3489(&self) -> bool {
        self.len as usize == LEN_RFC3489
    }

    /// Generates a fresh 96-bit transaction id (modern mode only; a
    /// client never needs to mint an RFC3489 legacy id of its own).
    pub fn generate(rng: &mut impl RngCore) -> Self {
        let mut bytes = [0u8; LEN_RFC5389];
        rng.fill_bytes(&mut bytes);
        Self::from_slice(&bytes).expect("12 bytes is always a valid transaction id")
    }
}

impl PartialEq for TransactionId {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Hash for TransactionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn rejects_bad_lengths() {
        assert!(TransactionId::from_slice(&[0u8; 11]).is_none());
        assert!(TransactionId::from_slice(&[0u8; 17]).is_none());
        assert!(TransactionId::from_slice(&[0u8; 12]).is_some());
        assert!(TransactionId::from_slice(&[0u8; 16]).is_some());
    }

    #[test]
    fn equality_ignores_trailing_buffer_garbage() {
        let a = TransactionId::from_slice(&[1u8; 12]).unwrap();
        let mut raw = [9u8; 16];
        raw[..12].copy_from_slice(&[1u8; 12]);
        let b = TransactionId {
            bytes: raw,
            len: 12,
        };
        assert_eq!(a, b);
    }

    #[test]
    fn generate_produces_96_bit_id() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let tid = TransactionId::generate(&mut rng);
        assert_eq!(tid.as_bytes().len(), LEN_RFC5389);
        assert!(!tid.is_rfc3489());
    }
}
