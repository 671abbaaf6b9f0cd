use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::errors::AttributeDecodeError;
use super::types::StunAttributeType;
use super::utils::xor_byte_range;
use super::StunAttribute;

use crate::definitions::{STUN_FINGERPRINT_XOR, STUN_MAGIC_COOKIE};
use crate::transaction_id::TransactionId;
use crate::view::View;

impl StunAttribute {
    #[allow(clippy::many_single_char_names)]
    // Decodes MappedAddress/XorMappedAddress/AlternateServer attributes.
    fn decode_address(
        value: View<'_>,
        is_xored: bool,
        transaction_id: &TransactionId,
    ) -> Result<SocketAddr, AttributeDecodeError> {
        if value.len() < 4 {
            return Err(AttributeDecodeError::InsufficientData());
        }

        let family = value.assured_read_u8(1);
        let mut port_bytes = [value.assured_read_u8(2), value.assured_read_u8(3)];
        if is_xored {
            xor_byte_range(&mut port_bytes, &STUN_MAGIC_COOKIE);
        }
        let port = u16::from_be_bytes(port_bytes);

        let addr_view = value
            .subview_from(4)
            .ok_or(AttributeDecodeError::InsufficientData())?;

        let ip_addr = match family {
            0x01 => {
                if addr_view.len() < 4 {
                    return Err(AttributeDecodeError::InsufficientData());
                }
                let mut octets = [
                    addr_view.assured_read_u8(0),
                    addr_view.assured_read_u8(1),
                    addr_view.assured_read_u8(2),
                    addr_view.assured_read_u8(3),
                ];
                if is_xored {
                    xor_byte_range(&mut octets, &STUN_MAGIC_COOKIE);
                }
                IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
            }
            0x02 => {
                if addr_view.len() < 16 {
                    return Err(AttributeDecodeError::InsufficientData());
                }
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(&addr_view.assured_subview(0, 16).data()[..16]);
                if is_xored {
                    xor_byte_range(&mut bytes[0..4], &STUN_MAGIC_COOKIE);
                    xor_byte_range(&mut bytes[4..16], transaction_id.as_bytes());
                }
                let mut segments = [0u16; 8];
                for (i, seg) in segments.iter_mut().enumerate() {
                    *seg = u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
                }
                IpAddr::V6(Ipv6Addr::new(
                    segments[0],
                    segments[1],
                    segments[2],
                    segments[3],
                    segments[4],
                    segments[5],
                    segments[6],
                    segments[7],
                ))
            }
            other => return Err(AttributeDecodeError::InvalidValue(other as u128)),
        };

        Ok(SocketAddr::new(ip_addr, port))
    }

    fn decode_utf8_val(value: View<'_>) -> Result<String, AttributeDecodeError> {
        String::from_utf8(value.data().to_vec()).map_err(|_| AttributeDecodeError::InvalidString())
    }

    fn decode_u32_val(value: View<'_>) -> Result<u32, AttributeDecodeError> {
        value
            .read_u32be(0)
            .ok_or(AttributeDecodeError::InsufficientData())
    }

    fn decode_u64_val(value: View<'_>) -> Result<u64, AttributeDecodeError> {
        value
            .read_u64be(0)
            .ok_or(AttributeDecodeError::InsufficientData())
    }

    fn decode_error_code(value: View<'_>) -> Result<Self, AttributeDecodeError> {
        if value.len() < 4 {
            return Err(AttributeDecodeError::InsufficientData());
        }
        let class = value.assured_read_u8(2) & 0b0000_0111;
        let number = value.assured_read_u8(3);
        let reason = String::from_utf8(value.assured_subview(4, value.len() - 4).data().to_vec())
            .map_err(|_| AttributeDecodeError::InvalidString())?;

        Ok(Self::ErrorCode {
            class,
            number,
            reason,
        })
    }

    fn decode_unknown_attributes(value: View<'_>) -> Result<Self, AttributeDecodeError> {
        let mut types = Vec::new();
        let mut offset = 0;
        while offset + 2 <= value.len() {
            types.push(
                value
                    .read_u16be(offset)
                    .ok_or(AttributeDecodeError::InsufficientData())?,
            );
            offset += 2;
        }
        Ok(Self::UnknownAttributes { types })
    }

    /// Decodes a single attribute's value given its already-split wire
    /// type and value bytes. Unrecognized types are the caller's
    /// responsibility (the message parser turns them into
    /// `StunAttribute::Unknown` rather than calling this).
    pub(crate) fn decode(
        attr_type: StunAttributeType,
        value: View<'_>,
        transaction_id: &TransactionId,
    ) -> Result<Self, AttributeDecodeError> {
        match attr_type {
            StunAttributeType::XorMappedAddress => Ok(Self::XorMappedAddress {
                socket_addr: Self::decode_address(value, true, transaction_id)?,
            }),
            StunAttributeType::MappedAddress => Ok(Self::MappedAddress {
                socket_addr: Self::decode_address(value, false, transaction_id)?,
            }),
            StunAttributeType::Username => Ok(Self::Username {
                value: Self::decode_utf8_val(value)?,
            }),
            StunAttributeType::MessageIntegrity => {
                if value.len() != 20 {
                    return Err(AttributeDecodeError::InsufficientData());
                }
                Ok(Self::MessageIntegrity {
                    key: value.data().to_vec(),
                })
            }
            StunAttributeType::Software => Ok(Self::Software {
                description: Self::decode_utf8_val(value)?,
            }),
            StunAttributeType::AlternateServer => Ok(Self::AlternateServer {
                socket_addr: Self::decode_address(value, false, transaction_id)?,
            }),
            StunAttributeType::Realm => Ok(Self::Realm {
                value: Self::decode_utf8_val(value)?,
            }),
            StunAttributeType::Nonce => Ok(Self::Nonce {
                value: Self::decode_utf8_val(value)?,
            }),
            StunAttributeType::Fingerprint => Ok(Self::Fingerprint {
                value: Self::decode_u32_val(value)? ^ STUN_FINGERPRINT_XOR,
            }),
            StunAttributeType::IceControlled => Ok(Self::IceControlled {
                tie_breaker: Self::decode_u64_val(value)?,
            }),
            StunAttributeType::IceControlling => Ok(Self::IceControlling {
                tie_breaker: Self::decode_u64_val(value)?,
            }),
            StunAttributeType::Priority => Ok(Self::Priority {
                value: Self::decode_u32_val(value)?,
            }),
            StunAttributeType::ErrorCode => Self::decode_error_code(value),
            StunAttributeType::UnknownAttributes => Self::decode_unknown_attributes(value),
            StunAttributeType::UseCandidate => Ok(Self::UseCandidate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::encode::EncodedAttribute;

    fn tid() -> TransactionId {
        TransactionId::from_slice(&[7u8; 12]).unwrap()
    }

    #[test]
    fn xor_mapped_address_ipv4_round_trips() {
        let addr: SocketAddr = "10.0.0.1:3478".parse().unwrap();
        let attr = StunAttribute::XorMappedAddress { socket_addr: addr };
        let EncodedAttribute { value, .. } = attr.encode_value(&tid()).unwrap();
        let decoded = StunAttribute::decode(
            StunAttributeType::XorMappedAddress,
            View::new(&value),
            &tid(),
        )
        .unwrap();
        match decoded {
            StunAttribute::XorMappedAddress { socket_addr } => assert_eq!(socket_addr, addr),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn xor_mapped_address_ipv6_round_trips() {
        let addr: SocketAddr = "[2001:db8::1]:4242".parse().unwrap();
        let attr = StunAttribute::XorMappedAddress { socket_addr: addr };
        let id = tid();
        let EncodedAttribute { value, .. } = attr.encode_value(&id).unwrap();
        let decoded =
            StunAttribute::decode(StunAttributeType::XorMappedAddress, View::new(&value), &id)
                .unwrap();
        match decoded {
            StunAttribute::XorMappedAddress { socket_addr } => assert_eq!(socket_addr, addr),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn error_code_splits_class_and_number() {
        let value = [0x00, 0x00, 0x04, 0x14, b'b', b'a', b'd'];
        let decoded =
            StunAttribute::decode(StunAttributeType::ErrorCode, View::new(&value), &tid())
                .unwrap();
        match decoded {
            StunAttribute::ErrorCode {
                class,
                number,
                reason,
            } => {
                assert_eq!(class, 4);
                assert_eq!(number, 0x14);
                assert_eq!(reason, "bad");
            }
            _ => panic!("wrong variant"),
        }
    }
}
