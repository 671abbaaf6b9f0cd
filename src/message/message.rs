use crate::attribute::AttributeSet;
use crate::header::{StunHeader, StunMessageClass, StunMessageMethod};
use crate::transaction_id::TransactionId;
use crate::view::Interval;

/// A parsed or assembled STUN message: header, attribute set, and (if
/// parsed from bytes that carried one) the byte interval MESSAGE-
/// INTEGRITY was computed over.
///
/// Carries no borrow on the bytes it was parsed from — `integrity_region`
/// is an offset/length pair, not a pointer, so `is_valid` can re-walk
/// whatever bytes the caller presents later (RFC 5389 §15.4).
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) header: StunHeader,
    pub(crate) attrs: AttributeSet,
    pub(crate) integrity_region: Option<Interval>,
}

impl Message {
    pub(crate) fn new(
        method: StunMessageMethod,
        class: StunMessageClass,
        transaction_id: Option<TransactionId>,
    ) -> Self {
        Self {
            header: StunHeader::new(method, class, transaction_id),
            attrs: AttributeSet::new(),
            integrity_region: None,
        }
    }

    pub fn class(&self) -> StunMessageClass {
        self.header.message_class
    }

    pub fn method(&self) -> StunMessageMethod {
        self.header.message_method
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.header.transaction_id
    }

    pub fn is_rfc3489(&self) -> bool {
        self.header.is_rfc3489
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attrs
    }

    pub fn header(&self) -> &StunHeader {
        &self.header
    }

    /// The byte interval integrity was computed over, recorded during
    /// parse. `None` if the message carried no MESSAGE-INTEGRITY
    /// attribute.
    pub fn integrity_region(&self) -> Option<Interval> {
        self.integrity_region
    }

    /// RFC 5389 §11: an error response with code 300 (Try Alternate).
    pub fn is_alternate_server(&self) -> bool {
        self.header.message_class == StunMessageClass::ErrorResponse
            && matches!(self.attrs.error_code(), Some((3, 0, _)))
    }
}
