use std::time::Duration;

use crate::password::IntegrityData;

/// Authentication the client signs outgoing requests with: a USERNAME
/// value and the already-derived `IntegrityData` used both to sign the
/// request and to verify the response's MESSAGE-INTEGRITY.
#[derive(Clone)]
pub struct Auth {
    pub username: String,
    pub integrity: IntegrityData,
}

/// Client-wide configuration. Field defaults mirror the RFC 8489
/// recommended values the original's `stun_client_udp_settings.hpp`
/// ships (`Rc=7`, `Rm=16`, `initial_rto=500ms`,
/// `server_error_max_retransmits=4`).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Attach a FINGERPRINT attribute to every outgoing request.
    pub use_fingerprint: bool,
    /// Initial retransmission timeout before any RTT sample exists for
    /// a path.
    pub initial_rto: Duration,
    /// How long a path's RTO history is kept without a fresh sample
    /// before it's pruned (RFC 6298 history is only useful while the
    /// path keeps being used).
    pub rto_history_duration: Duration,
    /// Request count (Rc): total number of times a request is sent
    /// before the transaction times out.
    pub request_count: u32,
    /// Retransmission multiplier (Rm) applied to `initial_rto` for the
    /// final wait after the last retransmit.
    pub retransmission_multiplier: u32,
    /// Upper floor applied to the doubled retransmit timeout, if set.
    pub max_rto: Option<Duration>,
    /// 5xx retransmit timeout. `None` fails a transaction immediately
    /// on a 5xx response instead of retrying it.
    pub server_error_timeout: Option<Duration>,
    /// Maximum number of 5xx-triggered retransmits (RFC 8489 §6.3.4
    /// recommends 4).
    pub server_error_max_retransmits: u32,
    /// RFC 5389 §11: accept an unsigned ALTERNATE-SERVER (300) response
    /// even when the transaction carries auth. Off by default.
    pub allow_unauthenticated_alternate: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_fingerprint: true,
            initial_rto: Duration::from_millis(500),
            rto_history_duration: Duration::from_secs(3600),
            request_count: 7,
            retransmission_multiplier: 16,
            max_rto: None,
            server_error_timeout: None,
            server_error_max_retransmits: 4,
            allow_unauthenticated_alternate: false,
        }
    }
}
