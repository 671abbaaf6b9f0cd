use crate::attribute::StunAttribute;
use crate::crypto::hmac;
use crate::definitions::STUN_HEADER_SIZE;
use crate::error::Result;
use crate::password::IntegrityData;
use crate::password::MaybeIntegrity;
use crate::view::View;

use super::errors::MessageEncodeError;
use super::message::Message;
use super::private_utils::crc32_of;

impl Message {
    /// Encodes the message into its wire representation (RFC 5389 §6 /
    /// RFC 8489).
    ///
    /// A MESSAGE-INTEGRITY placeholder added by
    /// `add_message_integrity`/`add_long_term_credential_message_integrity`
    /// is replaced with the real HMAC-SHA1, signed with `integrity`. A
    /// FINGERPRINT placeholder added by `add_fingerprint` is replaced
    /// with the real CRC-32. Both must be the attributes added last,
    /// MESSAGE-INTEGRITY first if both are present (RFC 5389 §15).
    pub fn build(&self, integrity: &MaybeIntegrity) -> std::result::Result<Vec<u8>, MessageEncodeError> {
        let tid = self.header.transaction_id;
        let attr_count = self.attrs.len();

        let mut header = self.header;
        header.message_len = 0;
        let mut buf = header.encode();

        let mut integrity_seen = false;

        for (idx, attr) in self.attrs.iter().enumerate() {
            let encoded = match attr {
                StunAttribute::Fingerprint { .. } => {
                    if idx != attr_count - 1 {
                        return Err(MessageEncodeError::FingerprintNotLast());
                    }
                    set_message_len(&mut buf, 8);
                    let crc = crc32_of(&buf);
                    StunAttribute::Fingerprint { value: crc }.build(&tid)?
                }
                StunAttribute::MessageIntegrity { key } if key.is_empty() => {
                    integrity_seen = true;
                    let integrity = integrity
                        .as_ref()
                        .ok_or(MessageEncodeError::MissingIntegrityData())?;
                    set_message_len(&mut buf, 24);
                    let hmac_value = hmac::digest(
                        &[View::new(&buf)],
                        integrity.password.opad(),
                        integrity.password.ipad(),
                        &integrity.hash,
                    )?;
                    StunAttribute::MessageIntegrity {
                        key: hmac_value.to_vec(),
                    }
                    .build(&tid)?
                }
                StunAttribute::MessageIntegrity { .. } => {
                    integrity_seen = true;
                    attr.build(&tid)?
                }
                _ => {
                    if integrity_seen {
                        return Err(MessageEncodeError::AttributeAfterIntegrity());
                    }
                    attr.build(&tid)?
                }
            };
            buf.extend_from_slice(&encoded);
        }

        set_message_len(&mut buf, 0);
        Ok(buf)
    }

    /// Recomputes MESSAGE-INTEGRITY over `bytes` (the same bytes this
    /// message was parsed from) and compares it to the attribute's
    /// stored value.
    ///
    /// Returns `Ok(None)` if no MESSAGE-INTEGRITY was present at parse
    /// time (`integrity_region` unset); the caller decides whether
    /// that's acceptable.
    pub fn is_valid(&self, bytes: &[u8], integrity: &IntegrityData) -> Result<Option<bool>> {
        let region = match self.integrity_region {
            Some(region) => region,
            None => return Ok(None),
        };
        let actual = match self.attrs.message_integrity() {
            Some(actual) => actual,
            None => return Ok(None),
        };

        let mut prefix = bytes[region.offset..region.offset + region.count].to_vec();
        set_message_len(&mut prefix, 24);
        let computed = hmac::digest(
            &[View::new(&prefix)],
            integrity.password.opad(),
            integrity.password.ipad(),
            &integrity.hash,
        )?;

        Ok(Some(computed.as_slice() == actual))
    }
}

/// Patches the header's length field to cover everything currently in
/// `buf` past the header, plus `trailing` bytes not yet appended.
fn set_message_len(buf: &mut [u8], trailing: usize) {
    let len = (buf.len() - STUN_HEADER_SIZE + trailing) as u16;
    buf[2..4].copy_from_slice(&len.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::StunMessageMethod;

    #[test]
    fn plain_request_has_no_attributes() {
        let msg = Message::new_request(StunMessageMethod::BindingRequest, None);
        let bytes = msg.build(&None).unwrap();
        assert_eq!(bytes.len(), STUN_HEADER_SIZE);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), 0);
    }

    #[test]
    fn fingerprint_not_last_is_rejected() {
        let msg = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_fingerprint()
            .add_attribute(StunAttribute::UseCandidate);
        assert!(matches!(
            msg.build(&None),
            Err(MessageEncodeError::FingerprintNotLast())
        ));
    }

    #[test]
    fn missing_integrity_data_is_rejected() {
        let msg = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_message_integrity();
        assert!(matches!(
            msg.build(&None),
            Err(MessageEncodeError::MissingIntegrityData())
        ));
    }

    #[test]
    fn is_valid_checks_against_the_signing_password() {
        use super::super::decode::ParseStat;
        use crate::crypto::default_sha1;
        use crate::password::{IntegrityData, Password};

        let hash = default_sha1();
        let password = Password::short_term("secret", &hash).unwrap();
        let integrity = IntegrityData {
            password,
            hash: hash.clone(),
        };

        let msg = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_message_integrity();
        let bytes = msg.build(&Some(integrity.clone())).unwrap();

        let mut stat = ParseStat::default();
        let parsed = Message::parse(&bytes, &mut stat).unwrap();
        assert_eq!(parsed.is_valid(&bytes, &integrity).unwrap(), Some(true));

        let wrong = IntegrityData {
            password: Password::short_term("wrong", &hash).unwrap(),
            hash,
        };
        assert_eq!(parsed.is_valid(&bytes, &wrong).unwrap(), Some(false));
    }
}
