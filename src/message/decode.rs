use log::{trace, warn};
use num_traits::FromPrimitive;

use crate::attribute::{AttributeSet, StunAttribute, StunAttributeType};
use crate::definitions::{STUN_ATTR_HEADER_SIZE, STUN_HEADER_SIZE};
use crate::header::StunHeader;
use crate::view::{Interval, View};

use super::errors::MessageDecodeError;
use super::message::Message;
use super::private_utils::crc32_of;

/// Parse-time counters, incremented alongside every decode decision.
/// Never affects control flow — a failed parse still updates the
/// relevant counter before returning `Err`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseStat {
    pub messages_parsed: u64,
    pub messages_failed: u64,
    pub attributes_decoded: u64,
    pub attributes_unknown: u64,
    pub attributes_skipped_after_integrity: u64,
    pub fingerprint_checked: u64,
    pub fingerprint_failed: u64,
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

impl Message {
    /// Parses a STUN message per RFC 5389 §6 / RFC 8489.
    ///
    /// Records `integrity_region` as the byte interval `[0,
    /// offset_of_MESSAGE_INTEGRITY)` so `is_valid` can later recompute
    /// the HMAC over the same prefix of caller-presented bytes.
    pub fn parse(bytes: &[u8], stat: &mut ParseStat) -> Result<Self, MessageDecodeError> {
        trace!("stun message: parsing {} bytes", bytes.len());
        let view = View::new(bytes);
        let header = match StunHeader::decode(view) {
            Ok(header) => header,
            Err(err) => {
                stat.messages_failed += 1;
                return Err(MessageDecodeError::from(err));
            }
        };

        let body_len = bytes.len() - STUN_HEADER_SIZE;
        if header.message_len % 4 != 0 || header.message_len as usize != body_len {
            stat.messages_failed += 1;
            return Err(MessageDecodeError::InvalidMessageLength {
                message_len: header.message_len,
                actual: body_len,
            });
        }

        let mut attrs = AttributeSet::new();
        let mut integrity_region = None;
        let mut seen_integrity = false;
        let mut offset = STUN_HEADER_SIZE;

        while offset < bytes.len() {
            if offset + STUN_ATTR_HEADER_SIZE > bytes.len() {
                stat.messages_failed += 1;
                return Err(MessageDecodeError::AttributeOverrunsMessage { offset });
            }
            let attr_type_raw = view.assured_read_u16be(offset);
            let attr_len = view.assured_read_u16be(offset + 2) as usize;
            let value_start = offset + STUN_ATTR_HEADER_SIZE;
            let value_end = value_start + attr_len;
            if value_end > bytes.len() {
                stat.messages_failed += 1;
                return Err(MessageDecodeError::AttributeOverrunsMessage { offset });
            }
            let value_view = view.assured_subview(value_start, attr_len);
            let next_offset = value_end + padding(attr_len);

            let is_fingerprint = attr_type_raw == StunAttributeType::Fingerprint as u16;
            let is_integrity = attr_type_raw == StunAttributeType::MessageIntegrity as u16;

            // RFC 5389 §15.4: agents MUST ignore attributes that follow
            // MESSAGE-INTEGRITY, except FINGERPRINT. This also covers the
            // duplicate-MESSAGE-INTEGRITY case: a second MI attribute is
            // not FINGERPRINT, so it is silently skipped here.
            if seen_integrity && !is_fingerprint {
                stat.attributes_skipped_after_integrity += 1;
                offset = next_offset;
                continue;
            }

            if is_fingerprint {
                stat.fingerprint_checked += 1;
                if attr_len != 4 {
                    stat.messages_failed += 1;
                    return Err(MessageDecodeError::AttributeOverrunsMessage { offset });
                }
                let decoded_attr =
                    StunAttribute::decode(StunAttributeType::Fingerprint, value_view, &header.transaction_id)?;
                let decoded_value = match decoded_attr {
                    StunAttribute::Fingerprint { value } => value,
                    _ => unreachable!(),
                };
                let computed = crc32_of(&bytes[0..offset]);
                if decoded_value != computed {
                    stat.fingerprint_failed += 1;
                    warn!(
                        "stun message: fingerprint mismatch (attr {:#010x}, computed {:#010x})",
                        decoded_value, computed
                    );
                    return Err(MessageDecodeError::FingerprintMismatch {
                        attr_value: decoded_value,
                        computed_value: computed,
                    });
                }
                if next_offset != bytes.len() {
                    return Err(MessageDecodeError::FingerprintNotLast());
                }
                attrs.insert(decoded_attr);
                stat.attributes_decoded += 1;
                offset = next_offset;
                continue;
            }

            if is_integrity {
                integrity_region = Some(Interval {
                    offset: 0,
                    count: offset,
                });
                seen_integrity = true;
            }

            let decoded_attr = match <StunAttributeType as FromPrimitive>::from_u16(attr_type_raw) {
                Some(known) => StunAttribute::decode(known, value_view, &header.transaction_id)?,
                None => {
                    stat.attributes_unknown += 1;
                    trace!("stun message: unknown attribute type {:#06x}, carried opaquely", attr_type_raw);
                    StunAttribute::Unknown {
                        attr_type: attr_type_raw,
                        bytes: value_view.data().to_vec(),
                    }
                }
            };
            attrs.insert(decoded_attr);
            stat.attributes_decoded += 1;
            offset = next_offset;
        }

        stat.messages_parsed += 1;
        trace!("stun message: parsed {} attributes", stat.attributes_decoded);
        Ok(Self {
            header,
            attrs,
            integrity_region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{StunMessageClass, StunMessageMethod};
    use crate::password::MaybeIntegrity;

    #[test]
    fn rejects_short_buffer() {
        let mut stat = ParseStat::default();
        assert!(Message::parse(&[0u8; 10], &mut stat).is_err());
        assert_eq!(stat.messages_failed, 1);
    }

    #[test]
    fn round_trips_simple_binding_request() {
        let mut stat = ParseStat::default();
        let msg = Message::new_request(StunMessageMethod::BindingRequest, None);
        let bytes = msg.build(&MaybeIntegrity::None).unwrap();
        let parsed = Message::parse(&bytes, &mut stat).unwrap();
        assert_eq!(parsed.class(), StunMessageClass::Request);
        assert_eq!(parsed.transaction_id(), msg.transaction_id());
        assert_eq!(stat.messages_parsed, 1);
    }
}
