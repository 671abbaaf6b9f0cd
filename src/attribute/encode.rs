use std::net::SocketAddr;

use super::errors::AttributeEncodeError;
use super::StunAttribute;

use crate::definitions::{STUN_FINGERPRINT_XOR, STUN_MAGIC_COOKIE};
use crate::transaction_id::TransactionId;
use super::utils::xor_byte_range;

/// An attribute's wire type plus its unpadded value bytes, prior to
/// TLV framing. Kept internal: message build needs to special-case
/// MESSAGE-INTEGRITY/FINGERPRINT framing around this, so the TLV wrap
/// step is split out as `build`.
pub(crate) struct EncodedAttribute {
    pub attr_type: u16,
    pub value: Vec<u8>,
}

fn pad_len(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn wrap_in_tlv(attr_type: u16, value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + value.len() + 3);
    buf.extend_from_slice(&attr_type.to_be_bytes());
    buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
    buf.extend_from_slice(value);
    buf.extend(std::iter::repeat(0u8).take(pad_len(value.len())));
    buf
}

impl StunAttribute {
    #[allow(clippy::many_single_char_names)]
    fn encode_address(
        addr: &SocketAddr,
        is_xored: bool,
        transaction_id: &TransactionId,
    ) -> Vec<u8> {
        let family: u8 = match addr {
            SocketAddr::V4(_) => 0x01,
            SocketAddr::V6(_) => 0x02,
        };

        let mut port_bytes = addr.port().to_be_bytes();
        if is_xored {
            xor_byte_range(&mut port_bytes, &STUN_MAGIC_COOKIE);
        }

        let addr_bytes: Vec<u8> = match addr {
            SocketAddr::V4(addr_v4) => {
                let mut octets = addr_v4.ip().octets();
                if is_xored {
                    xor_byte_range(&mut octets, &STUN_MAGIC_COOKIE);
                }
                octets.to_vec()
            }
            SocketAddr::V6(addr_v6) => {
                let mut bytes = [0u8; 16];
                for (i, seg) in addr_v6.ip().segments().iter().enumerate() {
                    bytes[i * 2..i * 2 + 2].copy_from_slice(&seg.to_be_bytes());
                }
                if is_xored {
                    xor_byte_range(&mut bytes[0..4], &STUN_MAGIC_COOKIE);
                    xor_byte_range(&mut bytes[4..16], transaction_id.as_bytes());
                }
                bytes.to_vec()
            }
        };

        let mut buf = Vec::with_capacity(4 + addr_bytes.len());
        buf.push(0);
        buf.push(family);
        buf.extend_from_slice(&port_bytes);
        buf.extend_from_slice(&addr_bytes);
        buf
    }

    fn encode_utf8_val(data: &str, limit: usize) -> Result<Vec<u8>, AttributeEncodeError> {
        let encoded = data.as_bytes().to_vec();
        if encoded.len() > limit {
            return Err(AttributeEncodeError::Utf8ValueTooBig {
                limit,
                length: encoded.len(),
            });
        }
        Ok(encoded)
    }

    fn encode_error_code(class: u8, number: u8, reason: &str) -> Result<Vec<u8>, AttributeEncodeError> {
        let mut buf = vec![0u8, 0u8, class, number];
        buf.extend_from_slice(&Self::encode_utf8_val(reason, 763)?);
        Ok(buf)
    }

    fn encode_unknown_attributes(types: &[u16]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(types.len() * 2);
        for t in types {
            buf.extend_from_slice(&t.to_be_bytes());
        }
        buf
    }

    /// Encodes the attribute's value bytes (unpadded, no TLV header).
    pub(crate) fn encode_value(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<EncodedAttribute, AttributeEncodeError> {
        let value = match self {
            Self::XorMappedAddress { socket_addr } => {
                Self::encode_address(socket_addr, true, transaction_id)
            }
            Self::MappedAddress { socket_addr } => {
                Self::encode_address(socket_addr, false, transaction_id)
            }
            Self::Username { value } => Self::encode_utf8_val(value, 513)?,
            Self::MessageIntegrity { key } => key.clone(),
            Self::Software { description } => Self::encode_utf8_val(description, 763)?,
            Self::AlternateServer { socket_addr } => {
                Self::encode_address(socket_addr, false, transaction_id)
            }
            Self::Realm { value } => Self::encode_utf8_val(value, 763)?,
            Self::Nonce { value } => Self::encode_utf8_val(value, 763)?,
            Self::Fingerprint { value } => (value ^ STUN_FINGERPRINT_XOR).to_be_bytes().to_vec(),
            Self::IceControlled { tie_breaker } => tie_breaker.to_be_bytes().to_vec(),
            Self::IceControlling { tie_breaker } => tie_breaker.to_be_bytes().to_vec(),
            Self::Priority { value } => value.to_be_bytes().to_vec(),
            Self::ErrorCode {
                class,
                number,
                reason,
            } => Self::encode_error_code(*class, *number, reason)?,
            Self::UnknownAttributes { types } => Self::encode_unknown_attributes(types),
            Self::UseCandidate => Vec::new(),
            Self::Unknown { bytes, .. } => bytes.clone(),
        };

        Ok(EncodedAttribute {
            attr_type: self.wire_type(),
            value,
        })
    }

    /// Encodes the attribute into its full TLV wire form, padded to a
    /// 4-byte boundary.
    pub(crate) fn build(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Vec<u8>, AttributeEncodeError> {
        let EncodedAttribute { attr_type, value } = self.encode_value(transaction_id)?;
        Ok(wrap_in_tlv(attr_type, &value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_value_to_four_byte_boundary() {
        let attr = StunAttribute::Username {
            value: "abc".to_string(),
        };
        let tid = TransactionId::from_slice(&[0u8; 12]).unwrap();
        let encoded = attr.build(&tid).unwrap();
        // header(4) + "abc"(3) + 1 pad byte = 8
        assert_eq!(encoded.len(), 8);
    }

    #[test]
    fn username_over_limit_is_rejected() {
        let attr = StunAttribute::Username {
            value: "a".repeat(600),
        };
        let tid = TransactionId::from_slice(&[0u8; 12]).unwrap();
        assert!(attr.build(&tid).is_err());
    }
}
