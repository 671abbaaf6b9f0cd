use std::collections::hash_map::RandomState;
use std::collections::{HashMap, VecDeque};
use std::hash::BuildHasher;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, info, warn};
use rand::RngCore;

use crate::attribute::StunAttribute;
use crate::clock::Timepoint;
use crate::error::{ClientError, Error, ErrorKind, Result};
use crate::header::{StunMessageClass, StunMessageMethod};
use crate::message::{Message, ParseStat};
use crate::path::Path;
use crate::retransmit::{Process5xxResult, RetransmitAlgo};
use crate::rto::RtoCalculator;
use crate::transaction_id::TransactionId;

use super::effect::{Effect, FailureReason, SendData, Sleep, TransactionFailed, TransactionOk};
use super::handle::Handle;
use super::settings::{Auth, Settings};
use super::timeline::Timeline;
use super::transaction::Transaction;

/// What a caller hands to `ClientUdp::create`: the network path the
/// request travels, the attributes the request should carry besides
/// USERNAME/MESSAGE-INTEGRITY/FINGERPRINT (those are added by `create`
/// itself), and optional auth.
pub struct Request {
    pub path: Path,
    pub attrs: Vec<StunAttribute>,
    pub maybe_auth: Option<Auth>,
}

/// Processing counters, one per decision branch in `response`/`next`,
/// mirroring `ClientUDP::Statistics` in the original.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    pub started: u64,
    pub success: u64,
    pub retransmits: u64,
    pub integrity_missing: u64,
    pub integrity_check_errors: u64,
    pub transaction_not_found: u64,
    pub unknown_attribute: u64,
    pub no_error_code: u64,
    pub try_alternate_responses: u64,
    pub no_alternate_server_attr: u64,
    pub response_3xx: u64,
    pub response_4xx: u64,
    pub response_5xx: u64,
    pub unexpected_response_code: u64,
    pub no_mapped_address: u64,
}

/// A UDP STUN client state machine (RFC 5389/8489 §7.2-7.3, RFC 6298
/// retransmission with Karn's algorithm). Holds no sockets and runs no
/// timers itself — every entry point takes `now` from the caller and
/// the step function `next` surfaces side effects (send, success,
/// failure, sleep) for an external driver to execute.
///
/// Grounded on `original_source/src/stun/stun_client_udp.{hpp,cpp}`.
///
/// Generic over the hasher backing the transaction-id lookup table: the
/// default, [`RandomState`], is already randomized per-process and so
/// resists hash-flooding from attacker-chosen transaction ids. A
/// deployment that trusts its peers and wants to skip that overhead can
/// swap in a faster, non-cryptographic `BuildHasher` via
/// [`ClientUdp::with_hasher`].
pub struct ClientUdp<S = RandomState> {
    settings: Settings,
    stat: Statistics,
    parse_stat: ParseStat,
    next_handle_value: u64,
    tid_to_handle: HashMap<TransactionId, Handle, S>,
    tmap: HashMap<Handle, Transaction>,
    timeline: Timeline,
    effects: VecDeque<Effect>,
    rto_calc: RtoCalculator,
}

impl ClientUdp<RandomState> {
    pub fn new(settings: Settings) -> Self {
        Self::with_hasher(settings, RandomState::default())
    }
}

impl<S: BuildHasher> ClientUdp<S> {
    pub fn with_hasher(settings: Settings, hasher: S) -> Self {
        let rto_calc = RtoCalculator::new(settings.initial_rto, settings.rto_history_duration);
        Self {
            settings,
            stat: Statistics::default(),
            parse_stat: ParseStat::default(),
            next_handle_value: 0,
            tid_to_handle: HashMap::with_hasher(hasher),
            tmap: HashMap::new(),
            timeline: Timeline::new(),
            effects: VecDeque::new(),
            rto_calc,
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stat
    }

    pub fn parse_stat(&self) -> ParseStat {
        self.parse_stat
    }

    /// Starts a new transaction: generates a transaction id not
    /// already in use, builds and sends the Binding request, and
    /// schedules its first retransmit wakeup.
    pub fn create(
        &mut self,
        rand: &mut impl RngCore,
        now: Timepoint,
        req: Request,
    ) -> Result<Handle> {
        loop {
            let tid = TransactionId::generate(rand);
            if !self.tid_to_handle.contains_key(&tid) {
                return self.do_create(now, tid, req);
            }
        }
    }

    fn do_create(&mut self, now: Timepoint, tid: TransactionId, req: Request) -> Result<Handle> {
        let mut message = Message::new_request(StunMessageMethod::BindingRequest, Some(tid));
        for attr in req.attrs {
            message = message.add_attribute(attr);
        }

        let maybe_integrity = match &req.maybe_auth {
            Some(auth) => {
                message = message
                    .add_attribute(StunAttribute::Username {
                        value: auth.username.clone(),
                    })
                    .add_message_integrity();
                Some(auth.integrity.clone())
            }
            None => None,
        };
        if self.settings.use_fingerprint {
            message = message.add_fingerprint();
        }

        let bytes = message
            .build(&maybe_integrity)
            .map_err(|e| Error::from(e).context("building request message"))?;

        let handle = self.allocate_handle();
        self.tid_to_handle.insert(tid, handle);

        let mut rtx_algo = self.allocate_rtx_algo(&req.path, now);
        let first_wakeup = rtx_algo.init(now);

        let transaction = Transaction {
            tid,
            handle,
            msg_bytes: Rc::new(bytes),
            rtx_algo,
            path: req.path,
            create_time: now,
            maybe_auth: req.maybe_auth,
            rtx_count: 0,
        };

        self.effects.push_back(Effect::SendData(SendData {
            handle,
            bytes: transaction.msg_bytes.clone(),
        }));
        if let Some(next) = first_wakeup {
            self.timeline.push(next, handle);
        }

        self.tmap.insert(handle, transaction);
        self.stat.started += 1;
        info!("stun client: started transaction {:?}", handle);
        Ok(handle)
    }

    /// Parses (or accepts an already-parsed) response, matches it to
    /// its transaction, verifies integrity if the transaction used
    /// auth, and classifies it into a success or failure effect.
    ///
    /// A response that fails to parse is rejected before the
    /// transaction table is even consulted — there's no well-formed
    /// transaction id to look up yet, so no statistics beyond the
    /// parse failure itself are recorded for it.
    pub fn response(
        &mut self,
        now: Timepoint,
        bytes: &[u8],
        pre_parsed: Option<Message>,
    ) -> Result<()> {
        let msg = match pre_parsed {
            Some(msg) => msg,
            None => Message::parse(bytes, &mut self.parse_stat)
                .map_err(|e| Error::from(e).context("parsing response message"))?,
        };

        let handle = match self.tid_to_handle.get(msg.transaction_id()).copied() {
            Some(h) => h,
            None => {
                self.stat.transaction_not_found += 1;
                return Err(Error::new(ClientError::TransactionNotFound));
            }
        };

        self.check_response_auth(handle, &msg, bytes)?;

        match msg.class() {
            StunMessageClass::SuccessResponse => self.handle_success_response(now, handle, msg),
            StunMessageClass::ErrorResponse => self.handle_error_response(now, handle, msg),
            _ => Ok(()),
        }
    }

    fn check_response_auth(&mut self, handle: Handle, msg: &Message, bytes: &[u8]) -> Result<()> {
        // RFC 5389 §10.1.2: the response MUST NOT contain USERNAME, so
        // only MESSAGE-INTEGRITY is checked here.
        let auth = match self.tmap.get(&handle).and_then(|t| t.maybe_auth.clone()) {
            Some(auth) => auth,
            None => return Ok(()),
        };

        match msg.is_valid(bytes, &auth.integrity)? {
            Some(true) => Ok(()),
            Some(false) => {
                self.stat.integrity_check_errors += 1;
                warn!("stun client: response failed integrity check for {:?}", handle);
                Err(Error::new(ClientError::DigestIsNotValid))
            }
            None => {
                if self.settings.allow_unauthenticated_alternate && msg.is_alternate_server() {
                    Ok(())
                } else {
                    self.stat.integrity_missing += 1;
                    Err(Error::new(ClientError::NoIntegrityAttributeInResponse))
                }
            }
        }
    }

    /// Drains any fired timeline entries (retransmitting or timing out
    /// the transactions they belong to), then pops one effect from the
    /// pending queue, cleaning up terminal effects as they're
    /// dequeued.
    pub fn next(&mut self, now: Timepoint) -> Effect {
        while let Some(handle) = self.timeline.pop_due(now) {
            let Some(t) = self.tmap.get_mut(&handle) else {
                continue; // stale entry: transaction already finished
            };
            match t.rtx_algo.next(now) {
                Some(next) => {
                    self.stat.retransmits += 1;
                    t.rtx_count += 1;
                    self.timeline.push(next, handle);
                    self.effects.push_back(Effect::SendData(SendData {
                        handle,
                        bytes: t.msg_bytes.clone(),
                    }));
                }
                None => {
                    self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                        handle,
                        reason: FailureReason::Timeout,
                    }));
                }
            }
        }

        if let Some(effect) = self.effects.pop_front() {
            if let Some(handle) = effect.terminal_handle() {
                self.cleanup(handle);
            }
            return effect;
        }

        match self.timeline.peek_time() {
            Some(next) => Effect::Sleep(Sleep {
                sleep: Duration::from_micros((next - now).max(0) as u64),
            }),
            None => Effect::Idle,
        }
    }

    fn handle_success_response(&mut self, now: Timepoint, handle: Handle, msg: Message) -> Result<()> {
        if msg.attributes().has_unknown_comprehension_required() {
            self.stat.unknown_attribute += 1;
            self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                handle,
                reason: FailureReason::UnknownComprehensionRequiredAttribute {
                    attrs: msg.attributes().unknown_comprehension_required().to_vec(),
                },
            }));
            return Ok(());
        }

        let t = self
            .tmap
            .get(&handle)
            .expect("transaction present for a handle found via tid_to_handle");

        let round_trip = if t.rtx_count == 0 {
            let rtt_micros = now - t.create_time;
            let rtt = Duration::from_micros(rtt_micros.max(0) as u64);
            self.rto_calc.new_rtt(now, t.path, rtt);
            Some(rtt)
        } else {
            let last_timeout = t.rtx_algo.last_timeout();
            self.rto_calc.backoff(now, t.path, last_timeout);
            None
        };

        let effect = match msg.attributes().reflexive_address() {
            Some(endpoint) => {
                self.stat.success += 1;
                Effect::TransactionOk(TransactionOk {
                    handle,
                    endpoint,
                    response: msg,
                    round_trip,
                })
            }
            None => {
                self.stat.no_mapped_address += 1;
                Effect::TransactionFailed(TransactionFailed {
                    handle,
                    reason: FailureReason::Error(Error::new(ClientError::NoAddressInResponse)),
                })
            }
        };
        self.effects.push_back(effect);
        Ok(())
    }

    fn handle_error_response(&mut self, now: Timepoint, handle: Handle, msg: Message) -> Result<()> {
        if msg.attributes().has_unknown_comprehension_required() {
            self.stat.unknown_attribute += 1;
            self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                handle,
                reason: FailureReason::UnknownComprehensionRequiredAttribute {
                    attrs: msg.attributes().unknown_comprehension_required().to_vec(),
                },
            }));
            return Ok(());
        }

        let (class, number, reason) = match msg.attributes().error_code() {
            Some(ec) => (ec.0, ec.1, ec.2.to_string()),
            None => {
                self.stat.no_error_code += 1;
                self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                    handle,
                    reason: FailureReason::Error(Error::new(ClientError::NoErrorCodeInResponse)),
                }));
                return Ok(());
            }
        };

        if msg.is_alternate_server() {
            self.stat.response_3xx += 1;
            match msg.attributes().alternate_server() {
                Some(server) => {
                    self.stat.try_alternate_responses += 1;
                    self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                        handle,
                        reason: FailureReason::AlternateServer { server },
                    }));
                }
                None => {
                    self.stat.no_alternate_server_attr += 1;
                    self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                        handle,
                        reason: FailureReason::Error(Error::new(ClientError::NoAlternateServerInResponse)),
                    }));
                }
            }
            return Ok(());
        }

        match class {
            3 => {
                self.stat.response_3xx += 1;
                self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                    handle,
                    reason: FailureReason::ErrorCode { class, number, reason },
                }));
            }
            4 => {
                self.stat.response_4xx += 1;
                if number == 20 {
                    if let Some(attrs) = msg.attributes().unknown_attributes() {
                        self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                            handle,
                            reason: FailureReason::UnknownAttributeReported {
                                attrs: attrs.to_vec(),
                            },
                        }));
                        return Ok(());
                    }
                }
                self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                    handle,
                    reason: FailureReason::ErrorCode { class, number, reason },
                }));
            }
            5 => {
                self.stat.response_5xx += 1;
                let t = self
                    .tmap
                    .get_mut(&handle)
                    .expect("transaction present for a handle found via tid_to_handle");
                match t.rtx_algo.process_5xx(now) {
                    Process5xxResult::RetransmitScheduled => {}
                    Process5xxResult::TransactionFailed => {
                        self.effects.push_back(Effect::TransactionFailed(TransactionFailed {
                            handle,
                            reason: FailureReason::ErrorCode { class, number, reason },
                        }));
                    }
                }
            }
            _ => {
                self.stat.unexpected_response_code += 1;
                debug!("stun client: unexpected response code class {}", class);
            }
        }
        Ok(())
    }

    fn allocate_handle(&mut self) -> Handle {
        loop {
            let handle = Handle(self.next_handle_value);
            self.next_handle_value = self.next_handle_value.wrapping_add(1);
            if !self.tmap.contains_key(&handle) {
                return handle;
            }
        }
    }

    fn allocate_rtx_algo(&self, path: &Path, now: Timepoint) -> RetransmitAlgo {
        let rto = self.rto_calc.rto(path);
        RetransmitAlgo::new(
            rto,
            self.settings.request_count,
            self.settings.retransmission_multiplier,
            self.settings.max_rto,
            self.settings.server_error_timeout,
            self.settings.server_error_max_retransmits,
            now,
        )
    }

    /// Removes a terminated transaction's bookkeeping. Its timeline
    /// entry, if one is still pending, is left in place and skipped as
    /// stale the next time it's popped rather than removed eagerly.
    fn cleanup(&mut self, handle: Handle) {
        if let Some(t) = self.tmap.remove(&handle) {
            self.tid_to_handle.remove(&t.tid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, SocketAddr};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::crypto::default_sha1;
    use crate::password::{IntegrityData, Password};

    fn path() -> Path {
        Path::new(IpAddr::from([127, 0, 0, 1]), IpAddr::from([203, 0, 113, 1]))
    }

    #[test]
    fn happy_path_binding_succeeds() {
        let mut client = ClientUdp::new(Settings::default());
        let mut rng = StdRng::seed_from_u64(1);
        let t0 = Timepoint::epoch();

        let handle = client
            .create(
                &mut rng,
                t0,
                Request {
                    path: path(),
                    attrs: vec![],
                    maybe_auth: None,
                },
            )
            .unwrap();

        match client.next(t0) {
            Effect::SendData(sd) => assert_eq!(sd.handle, handle),
            other => panic!("expected SendData, got {:?}", other),
        }

        let tid = client.tmap.get(&handle).unwrap().tid;
        let endpoint = SocketAddr::new(IpAddr::from([198, 51, 100, 7]), 54321);
        let response = Message::new_success_response(StunMessageMethod::BindingRequest, Some(tid))
            .add_attribute(StunAttribute::XorMappedAddress {
                socket_addr: endpoint,
            });
        let bytes = response.build(&None).unwrap();

        client.response(t0, &bytes, None).unwrap();

        match client.next(t0) {
            Effect::TransactionOk(ok) => {
                assert_eq!(ok.handle, handle);
                assert_eq!(ok.endpoint, endpoint);
                assert!(ok.round_trip.is_some());
            }
            other => panic!("expected TransactionOk, got {:?}", other),
        }
        assert_eq!(client.statistics().success, 1);
        assert!(!client.tmap.contains_key(&handle));
    }

    #[test]
    fn authenticated_binding_succeeds() {
        let mut client = ClientUdp::new(Settings::default());
        let mut rng = StdRng::seed_from_u64(2);
        let t0 = Timepoint::epoch();

        let hash = default_sha1();
        let password = Password::short_term("secret", &hash).unwrap();
        let integrity = IntegrityData {
            password,
            hash: hash.clone(),
        };
        let auth = Auth {
            username: "alice".to_string(),
            integrity: integrity.clone(),
        };

        let handle = client
            .create(
                &mut rng,
                t0,
                Request {
                    path: path(),
                    attrs: vec![],
                    maybe_auth: Some(auth),
                },
            )
            .unwrap();
        assert!(matches!(client.next(t0), Effect::SendData(_)));

        let tid = client.tmap.get(&handle).unwrap().tid;
        let endpoint = SocketAddr::new(IpAddr::from([198, 51, 100, 7]), 1234);
        let response = Message::new_success_response(StunMessageMethod::BindingRequest, Some(tid))
            .add_attribute(StunAttribute::XorMappedAddress {
                socket_addr: endpoint,
            })
            .add_message_integrity();
        let bytes = response.build(&Some(integrity)).unwrap();

        client.response(t0, &bytes, None).unwrap();
        match client.next(t0) {
            Effect::TransactionOk(ok) => assert_eq!(ok.endpoint, endpoint),
            other => panic!("expected TransactionOk, got {:?}", other),
        }
    }

    #[test]
    fn integrity_mismatch_is_rejected_and_transaction_survives() {
        let mut client = ClientUdp::new(Settings::default());
        let mut rng = StdRng::seed_from_u64(3);
        let t0 = Timepoint::epoch();

        let hash = default_sha1();
        let password = Password::short_term("secret", &hash).unwrap();
        let integrity = IntegrityData {
            password,
            hash: hash.clone(),
        };
        let auth = Auth {
            username: "alice".to_string(),
            integrity: integrity.clone(),
        };

        let handle = client
            .create(
                &mut rng,
                t0,
                Request {
                    path: path(),
                    attrs: vec![],
                    maybe_auth: Some(auth),
                },
            )
            .unwrap();
        assert!(matches!(client.next(t0), Effect::SendData(_)));

        let tid = client.tmap.get(&handle).unwrap().tid;
        let wrong_integrity = IntegrityData {
            password: Password::short_term("wrong", &hash).unwrap(),
            hash,
        };
        let endpoint = SocketAddr::new(IpAddr::from([198, 51, 100, 7]), 1234);
        let response = Message::new_success_response(StunMessageMethod::BindingRequest, Some(tid))
            .add_attribute(StunAttribute::XorMappedAddress {
                socket_addr: endpoint,
            })
            .add_message_integrity();
        let bytes = response.build(&Some(wrong_integrity)).unwrap();

        let err = client.response(t0, &bytes, None).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Client(ClientError::DigestIsNotValid)));
        assert_eq!(client.statistics().integrity_check_errors, 1);
        assert!(client.tmap.contains_key(&handle));
    }

    #[test]
    fn alternate_server_is_surfaced() {
        let mut client = ClientUdp::new(Settings::default());
        let mut rng = StdRng::seed_from_u64(4);
        let t0 = Timepoint::epoch();

        let handle = client
            .create(
                &mut rng,
                t0,
                Request {
                    path: path(),
                    attrs: vec![],
                    maybe_auth: None,
                },
            )
            .unwrap();
        assert!(matches!(client.next(t0), Effect::SendData(_)));

        let tid = client.tmap.get(&handle).unwrap().tid;
        let alternate = SocketAddr::new(IpAddr::from([203, 0, 113, 9]), 3478);
        let response = Message::new_error_response(StunMessageMethod::BindingRequest, Some(tid))
            .add_attribute(StunAttribute::ErrorCode {
                class: 3,
                number: 0,
                reason: "Try Alternate".to_string(),
            })
            .add_attribute(StunAttribute::AlternateServer {
                socket_addr: alternate,
            });
        let bytes = response.build(&None).unwrap();
        client.response(t0, &bytes, None).unwrap();

        match client.next(t0) {
            Effect::TransactionFailed(f) => {
                assert_eq!(f.handle, handle);
                match f.reason {
                    FailureReason::AlternateServer { server } => {
                        assert_eq!(server, alternate)
                    }
                    other => panic!("expected AlternateServer, got {:?}", other),
                }
            }
            other => panic!("expected TransactionFailed, got {:?}", other),
        }
        assert_eq!(client.statistics().try_alternate_responses, 1);
    }

    #[test]
    fn retransmit_budget_exhaustion_times_out() {
        let mut client = ClientUdp::new(Settings {
            request_count: 2,
            initial_rto: Duration::from_millis(100),
            ..Settings::default()
        });
        let mut rng = StdRng::seed_from_u64(5);
        let t0 = Timepoint::epoch();

        let handle = client
            .create(
                &mut rng,
                t0,
                Request {
                    path: path(),
                    attrs: vec![],
                    maybe_auth: None,
                },
            )
            .unwrap();

        let mut now = t0;
        let mut sends = 0;
        loop {
            match client.next(now) {
                Effect::SendData(sd) => {
                    assert_eq!(sd.handle, handle);
                    sends += 1;
                }
                Effect::Sleep(s) => now = now.advance(s.sleep),
                Effect::TransactionFailed(f) => {
                    assert_eq!(f.handle, handle);
                    assert!(matches!(f.reason, FailureReason::Timeout));
                    break;
                }
                other => panic!("unexpected effect {:?}", other),
            }
        }
        assert_eq!(sends, 2);
        assert!(!client.tmap.contains_key(&handle));
    }
}
