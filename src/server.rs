use std::collections::HashMap;
use std::net::SocketAddr;

use log::{debug, warn};

use crate::attribute::StunAttribute;
use crate::crypto::Sha1Func;
use crate::header::{StunMessageClass, StunMessageMethod};
use crate::message::{Message, ParseStat};
use crate::password::{IntegrityData, MaybeIntegrity, Password};

const ERR_BAD_REQUEST: (u8, u8) = (4, 0);
const ERR_UNAUTHORIZED: (u8, u8) = (4, 1);
const ERR_UNKNOWN_ATTRIBUTE: (u8, u8) = (4, 20);

/// Stateless STUN server settings.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub use_fingerprint: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_fingerprint: true,
        }
    }
}

/// Processing counters, incremented alongside every `process` decision.
/// Mirrors `ParseStat`'s "never fatal, always counted" discipline one
/// layer up.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    pub ignored_non_request: u64,
    pub ignored_unknown_method: u64,
    pub unknown_attribute: u64,
    pub bad_request: u64,
    pub unauthorized: u64,
    pub success: u64,
}

pub struct Respond {
    pub response: Message,
    pub request: Message,
    pub maybe_integrity: MaybeIntegrity,
}

pub struct Ignore {
    /// Set when the datagram parsed as a STUN message but wasn't a
    /// request this server answers (wrong class, or a method other
    /// than Binding).
    pub message: Option<Message>,
}

pub enum ProcessResult {
    Respond(Respond),
    Ignore(Ignore),
    Error(crate::error::Error),
}

/// A stateless STUN server (RFC 5389 §7.3, §10.1.2): no per-client
/// state beyond the user store, one request in, one response out.
///
/// Grounded on `original_source/src/stun/stun_server_stateless.{hpp,cpp}`.
pub struct Stateless {
    sha1: Sha1Func,
    settings: Settings,
    users: HashMap<String, Password>,
    parse_stat: ParseStat,
    stat: Statistics,
}

impl Stateless {
    pub fn new(sha1: Sha1Func, settings: Option<Settings>) -> Self {
        Self {
            sha1,
            settings: settings.unwrap_or_default(),
            users: HashMap::new(),
            parse_stat: ParseStat::default(),
            stat: Statistics::default(),
        }
    }

    pub fn add_user(&mut self, username: impl Into<String>, password: Password) {
        self.users.insert(username.into(), password);
    }

    pub fn parse_stat(&self) -> ParseStat {
        self.parse_stat
    }

    pub fn statistics(&self) -> Statistics {
        self.stat
    }

    /// Validates, authenticates and answers one request, per RFC 5389
    /// §7.3 and §10.1.2.
    pub fn process(&mut self, remote: SocketAddr, bytes: &[u8]) -> ProcessResult {
        let msg = match Message::parse(bytes, &mut self.parse_stat) {
            Ok(msg) => msg,
            Err(err) => {
                debug!("stun server: dropping unparsable datagram: {}", err);
                return ProcessResult::Ignore(Ignore { message: None });
            }
        };

        if msg.class() != StunMessageClass::Request {
            self.stat.ignored_non_request += 1;
            return ProcessResult::Ignore(Ignore { message: Some(msg) });
        }

        self.process_request(remote, msg, bytes)
    }

    fn process_request(&mut self, remote: SocketAddr, msg: Message, bytes: &[u8]) -> ProcessResult {
        if msg.attributes().has_unknown_comprehension_required() {
            self.stat.unknown_attribute += 1;
            warn!("stun server: rejecting request with unknown comprehension-required attributes");
            let mut response = create_error(&msg, ERR_UNKNOWN_ATTRIBUTE, None);
            response = response.add_attribute(StunAttribute::UnknownAttributes {
                types: msg.attributes().unknown_comprehension_required().to_vec(),
            });
            return ProcessResult::Respond(Respond {
                response,
                request: msg,
                maybe_integrity: None,
            });
        }

        // RFC 5389 §10.1.2: USERNAME and MESSAGE-INTEGRITY must appear together.
        let maybe_username = msg.attributes().username();
        let has_integrity = msg.attributes().message_integrity().is_some();
        if maybe_username.is_some() != has_integrity {
            self.stat.bad_request += 1;
            let response = create_error(&msg, ERR_BAD_REQUEST, None);
            return ProcessResult::Respond(Respond {
                response,
                request: msg,
                maybe_integrity: None,
            });
        }

        let mut maybe_integrity_data = None;
        if let Some(username) = maybe_username {
            let password = match self.users.get(username) {
                Some(password) => password.clone(),
                None => {
                    self.stat.unauthorized += 1;
                    let response = create_error(&msg, ERR_UNAUTHORIZED, None);
                    return ProcessResult::Respond(Respond {
                        response,
                        request: msg,
                        maybe_integrity: None,
                    });
                }
            };
            let integrity_data = IntegrityData {
                password,
                hash: self.sha1.clone(),
            };
            let is_valid = match msg.is_valid(bytes, &integrity_data) {
                Ok(v) => v,
                Err(err) => return ProcessResult::Error(err),
            };
            if is_valid == Some(false) {
                self.stat.unauthorized += 1;
                warn!("stun server: rejecting request with invalid message integrity");
                let response = create_error(&msg, ERR_UNAUTHORIZED, None);
                return ProcessResult::Respond(Respond {
                    response,
                    request: msg,
                    maybe_integrity: None,
                });
            }
            maybe_integrity_data = Some(integrity_data);
        }

        if msg.method() != StunMessageMethod::BindingRequest {
            self.stat.ignored_unknown_method += 1;
            return ProcessResult::Ignore(Ignore { message: Some(msg) });
        }

        self.stat.success += 1;
        let mut response =
            Message::new_success_response(msg.method(), Some(*msg.transaction_id()));
        response = if msg.is_rfc3489() {
            response.add_attribute(StunAttribute::MappedAddress {
                socket_addr: remote,
            })
        } else {
            response.add_attribute(StunAttribute::XorMappedAddress {
                socket_addr: remote,
            })
        };
        if !msg.is_rfc3489() && self.settings.use_fingerprint {
            response = response.add_fingerprint();
        }

        ProcessResult::Respond(Respond {
            response,
            request: msg,
            maybe_integrity: maybe_integrity_data,
        })
    }
}

fn create_error(
    request: &Message,
    (class, number): (u8, u8),
    reason: Option<&str>,
) -> Message {
    let reason = reason.unwrap_or("").to_string();
    Message::new_error_response(request.method(), Some(*request.transaction_id()))
        .add_attribute(StunAttribute::ErrorCode {
            class,
            number,
            reason,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::default_sha1;
    use crate::header::StunMessageMethod;
    use crate::password::MaybeIntegrity;
    use std::net::{IpAddr, Ipv4Addr};

    fn remote() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 3478)
    }

    #[test]
    fn unauthenticated_binding_succeeds() {
        let mut server = Stateless::new(default_sha1(), None);
        let req = Message::new_request(StunMessageMethod::BindingRequest, None);
        let bytes = req.build(&MaybeIntegrity::None).unwrap();

        match server.process(remote(), &bytes) {
            ProcessResult::Respond(r) => {
                assert_eq!(r.response.class(), StunMessageClass::SuccessResponse);
                assert_eq!(r.response.attributes().xor_mapped_address(), Some(remote()));
                assert!(r.response.attributes().has_fingerprint());
            }
            _ => panic!("expected Respond"),
        }
        assert_eq!(server.statistics().success, 1);
    }

    #[test]
    fn unknown_comprehension_required_attribute_yields_420() {
        let mut server = Stateless::new(default_sha1(), None);
        let req = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_attribute(StunAttribute::Unknown {
                attr_type: 0x0050,
                bytes: vec![0u8; 4],
            });
        let bytes = req.build(&MaybeIntegrity::None).unwrap();

        match server.process(remote(), &bytes) {
            ProcessResult::Respond(r) => {
                assert_eq!(r.response.attributes().error_code(), Some((4, 20, "")));
                assert_eq!(
                    r.response.attributes().unknown_attributes(),
                    Some(&[0x0050][..])
                );
            }
            _ => panic!("expected Respond"),
        }
    }

    #[test]
    fn username_without_integrity_is_bad_request() {
        let mut server = Stateless::new(default_sha1(), None);
        let req = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_attribute(StunAttribute::Username {
                value: "alice".to_string(),
            });
        let bytes = req.build(&MaybeIntegrity::None).unwrap();

        match server.process(remote(), &bytes) {
            ProcessResult::Respond(r) => {
                assert_eq!(r.response.attributes().error_code(), Some((4, 0, "")));
            }
            _ => panic!("expected Respond"),
        }
    }

    #[test]
    fn unknown_username_is_unauthorized() {
        let mut server = Stateless::new(default_sha1(), None);
        let hash = default_sha1();
        let password = Password::short_term("secret", &hash).unwrap();
        let req = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_long_term_credential_message_integrity("alice", "realm")
            .unwrap();
        let integrity = IntegrityData {
            password,
            hash,
        };
        let bytes = req.build(&Some(integrity)).unwrap();

        match server.process(remote(), &bytes) {
            ProcessResult::Respond(r) => {
                assert_eq!(r.response.attributes().error_code(), Some((4, 1, "")));
            }
            _ => panic!("expected Respond"),
        }
    }

    #[test]
    fn bad_integrity_is_unauthorized() {
        let mut server = Stateless::new(default_sha1(), None);
        let hash = default_sha1();
        server.add_user("alice", Password::short_term("correct", &hash).unwrap());

        let req = Message::new_request(StunMessageMethod::BindingRequest, None)
            .add_attribute(StunAttribute::Username {
                value: "alice".to_string(),
            })
            .add_message_integrity();
        let wrong = IntegrityData {
            password: Password::short_term("wrong", &hash).unwrap(),
            hash,
        };
        let bytes = req.build(&Some(wrong)).unwrap();

        match server.process(remote(), &bytes) {
            ProcessResult::Respond(r) => {
                assert_eq!(r.response.attributes().error_code(), Some((4, 1, "")));
            }
            _ => panic!("expected Respond"),
        }
        assert_eq!(server.statistics().unauthorized, 1);
    }

    #[test]
    fn non_request_is_ignored() {
        let mut server = Stateless::new(default_sha1(), None);
        let msg = Message::new_indication(StunMessageMethod::BindingRequest, None);
        let bytes = msg.build(&MaybeIntegrity::None).unwrap();

        match server.process(remote(), &bytes) {
            ProcessResult::Ignore(i) => assert!(i.message.is_some()),
            _ => panic!("expected Ignore"),
        }
    }
}
