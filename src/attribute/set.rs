use std::collections::BTreeMap;
use std::net::SocketAddr;

use super::attribute::StunAttribute;
use super::types::{is_comprehension_required, StunAttributeType};

/// Parsed (or assembled) attributes of a message, indexed by wire
/// type. Only the first occurrence of a given type is kept — RFC 5389
/// §15: "any duplicates MAY be ignored by a receiver" — while insertion
/// order is preserved so `build` emits attributes in a stable,
/// predictable sequence.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    order: Vec<StunAttribute>,
    index: BTreeMap<u16, usize>,
    /// Comprehension-required types seen that this crate doesn't
    /// recognize, in first-seen order — exactly what a 420 response's
    /// UNKNOWN-ATTRIBUTES list needs to echo back.
    unknown_comprehension_required: Vec<u16>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, dropping it if its type is already present.
    pub fn insert(&mut self, attr: StunAttribute) {
        let wire_type = attr.wire_type();
        if self.index.contains_key(&wire_type) {
            return;
        }
        if let StunAttribute::Unknown { attr_type, .. } = &attr {
            if is_comprehension_required(*attr_type) {
                self.unknown_comprehension_required.push(*attr_type);
            }
        }
        self.index.insert(wire_type, self.order.len());
        self.order.push(attr);
    }

    pub fn get(&self, wire_type: u16) -> Option<&StunAttribute> {
        self.index.get(&wire_type).map(|&i| &self.order[i])
    }

    pub fn contains(&self, wire_type: u16) -> bool {
        self.index.contains_key(&wire_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StunAttribute> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Comprehension-required attribute types present that this crate
    /// could not decode, in first-seen order.
    pub fn unknown_comprehension_required(&self) -> &[u16] {
        &self.unknown_comprehension_required
    }

    pub fn has_unknown_comprehension_required(&self) -> bool {
        !self.unknown_comprehension_required.is_empty()
    }

    pub fn username(&self) -> Option<&str> {
        match self.get(StunAttributeType::Username as u16) {
            Some(StunAttribute::Username { value }) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn message_integrity(&self) -> Option<&[u8]> {
        match self.get(StunAttributeType::MessageIntegrity as u16) {
            Some(StunAttribute::MessageIntegrity { key }) => Some(key.as_slice()),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<(u8, u8, &str)> {
        match self.get(StunAttributeType::ErrorCode as u16) {
            Some(StunAttribute::ErrorCode {
                class,
                number,
                reason,
            }) => Some((*class, *number, reason.as_str())),
            _ => None,
        }
    }

    pub fn unknown_attributes(&self) -> Option<&[u16]> {
        match self.get(StunAttributeType::UnknownAttributes as u16) {
            Some(StunAttribute::UnknownAttributes { types }) => Some(types.as_slice()),
            _ => None,
        }
    }

    pub fn alternate_server(&self) -> Option<SocketAddr> {
        match self.get(StunAttributeType::AlternateServer as u16) {
            Some(StunAttribute::AlternateServer { socket_addr }) => Some(*socket_addr),
            _ => None,
        }
    }

    pub fn xor_mapped_address(&self) -> Option<SocketAddr> {
        match self.get(StunAttributeType::XorMappedAddress as u16) {
            Some(StunAttribute::XorMappedAddress { socket_addr }) => Some(*socket_addr),
            _ => None,
        }
    }

    pub fn mapped_address(&self) -> Option<SocketAddr> {
        match self.get(StunAttributeType::MappedAddress as u16) {
            Some(StunAttribute::MappedAddress { socket_addr }) => Some(*socket_addr),
            _ => None,
        }
    }

    /// Preferred (XOR-MAPPED-ADDRESS) reflexive address, falling back
    /// to the legacy MAPPED-ADDRESS form.
    pub fn reflexive_address(&self) -> Option<SocketAddr> {
        self.xor_mapped_address().or_else(|| self.mapped_address())
    }

    pub fn priority(&self) -> Option<u32> {
        match self.get(StunAttributeType::Priority as u16) {
            Some(StunAttribute::Priority { value }) => Some(*value),
            _ => None,
        }
    }

    pub fn has_fingerprint(&self) -> bool {
        self.contains(StunAttributeType::Fingerprint as u16)
    }

    pub fn has_use_candidate(&self) -> bool {
        self.contains(StunAttributeType::UseCandidate as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_wins() {
        let mut set = AttributeSet::new();
        set.insert(StunAttribute::Username {
            value: "first".to_string(),
        });
        set.insert(StunAttribute::Username {
            value: "second".to_string(),
        });
        assert_eq!(set.username(), Some("first"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn unknown_comprehension_required_is_tracked_in_order() {
        let mut set = AttributeSet::new();
        set.insert(StunAttribute::Unknown {
            attr_type: 0x0050,
            bytes: vec![0],
        });
        set.insert(StunAttribute::Unknown {
            attr_type: 0x9999,
            bytes: vec![],
        });
        assert_eq!(set.unknown_comprehension_required(), &[0x0050]);
    }
}
