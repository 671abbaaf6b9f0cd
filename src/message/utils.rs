use stringprep::saslprep;

use crate::attribute::StunAttribute;
use crate::header::{StunMessageClass, StunMessageMethod};
use crate::transaction_id::TransactionId;

use super::message::Message;

impl Message {
    /// Creates a request message.
    pub fn new_request(method: StunMessageMethod, transaction_id: Option<TransactionId>) -> Self {
        Self::new(method, StunMessageClass::Request, transaction_id)
    }

    /// Creates a success response, normally answering a request's
    /// transaction id.
    pub fn new_success_response(
        method: StunMessageMethod,
        transaction_id: Option<TransactionId>,
    ) -> Self {
        Self::new(method, StunMessageClass::SuccessResponse, transaction_id)
    }

    /// Creates an error response, normally answering a request's
    /// transaction id.
    pub fn new_error_response(
        method: StunMessageMethod,
        transaction_id: Option<TransactionId>,
    ) -> Self {
        Self::new(method, StunMessageClass::ErrorResponse, transaction_id)
    }

    /// Creates an indication.
    pub fn new_indication(method: StunMessageMethod, transaction_id: Option<TransactionId>) -> Self {
        Self::new(method, StunMessageClass::Indication, transaction_id)
    }

    /// Adds an attribute, keeping only the first occurrence of any
    /// given wire type (see `AttributeSet::insert`).
    pub fn add_attribute(mut self, attr: StunAttribute) -> Self {
        self.attrs.insert(attr);
        self
    }

    /// Adds a FINGERPRINT placeholder. `build` replaces it with the
    /// real CRC-32 once every other attribute is in place.
    ///
    /// Must be the last attribute added.
    pub fn add_fingerprint(self) -> Self {
        self.add_attribute(StunAttribute::Fingerprint { value: 0 })
    }

    /// Adds a MESSAGE-INTEGRITY placeholder. `build` replaces it with
    /// the real HMAC-SHA1 once an `IntegrityData` is supplied.
    ///
    /// Must be added after USERNAME/REALM but before FINGERPRINT.
    pub fn add_message_integrity(self) -> Self {
        self.add_attribute(StunAttribute::MessageIntegrity { key: Vec::new() })
    }

    /// Adds USERNAME, REALM and a MESSAGE-INTEGRITY placeholder for
    /// long-term credential authentication.
    pub fn add_long_term_credential_message_integrity(
        self,
        username: &str,
        realm: &str,
    ) -> Result<Self, stringprep::Error> {
        let username = saslprep(username)?.to_string();
        let realm = saslprep(realm)?.to_string();
        Ok(self
            .add_attribute(StunAttribute::Username { value: username })
            .add_attribute(StunAttribute::Realm { value: realm })
            .add_message_integrity())
    }
}

impl Default for Message {
    /// A Binding Request with a freshly generated transaction id.
    fn default() -> Self {
        Self::new_request(StunMessageMethod::BindingRequest, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_a_binding_request() {
        let msg = Message::default();
        assert_eq!(msg.class(), StunMessageClass::Request);
        assert_eq!(msg.method(), StunMessageMethod::BindingRequest);
    }

    #[test]
    fn builder_chain_keeps_insertion_order() {
        let msg = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_attribute(StunAttribute::Username {
                value: "alice".to_string(),
            })
            .add_message_integrity()
            .add_fingerprint();
        assert_eq!(msg.attributes().username(), Some("alice"));
        assert!(msg.attributes().message_integrity().is_some());
        assert!(msg.attributes().has_fingerprint());
    }
}
