use std::collections::HashMap;
use std::time::Duration;

use crate::clock::Timepoint;
use crate::path::Path;

#[derive(Debug, Clone, Copy)]
struct Smoothed {
    srtt: Duration,
    rttvar: Duration,
}

#[derive(Debug, Clone, Copy)]
struct PathRecord {
    last_update: Timepoint,
    smooth: Option<Smoothed>,
    backoff: Option<Duration>,
}

/// Per-path RTO history (RFC 6298 SRTT/RTTVAR with Karn's algorithm),
/// keyed by `{source, target}` rather than by transaction: a path's
/// timing characteristics outlive any one request.
///
/// Grounded on the per-path RTO record kept by the original's
/// `stun_client_udp_rto` calculator, including its `history_duration`
/// setting (`stun_client_udp_settings.hpp`): a path not heard from in
/// that long has its record dropped, so a long-lived client talking to
/// many distinct source/target pairs doesn't grow `paths` unbounded.
#[derive(Debug, Clone, Default)]
pub struct RtoCalculator {
    initial_rto: Duration,
    history_duration: Duration,
    paths: HashMap<Path, PathRecord>,
}

impl RtoCalculator {
    pub fn new(initial_rto: Duration, history_duration: Duration) -> Self {
        Self {
            initial_rto,
            history_duration,
            paths: HashMap::new(),
        }
    }

    /// Current RTO estimate for `path`: Karn back-off if one is set,
    /// else `SRTT + 4*RTTVAR` if a sample has ever been taken, else the
    /// configured `initial_rto`.
    pub fn rto(&self, path: &Path) -> Duration {
        match self.paths.get(path) {
            Some(record) => record
                .backoff
                .or_else(|| record.smooth.map(|s| s.srtt + 4 * s.rttvar))
                .unwrap_or(self.initial_rto),
            None => self.initial_rto,
        }
    }

    /// Feeds a fresh (non-retransmitted) RTT sample into the path's
    /// history, clearing any previous Karn back-off.
    pub fn new_rtt(&mut self, now: Timepoint, path: Path, rtt: Duration) {
        self.clear_outdated(now);
        let record = self.paths.entry(path).or_insert(PathRecord {
            last_update: now,
            smooth: None,
            backoff: None,
        });
        record.last_update = now;
        record.backoff = None;
        record.smooth = Some(match record.smooth {
            None => Smoothed {
                srtt: rtt,
                rttvar: rtt / 2,
            },
            Some(prev) => {
                let diff = abs_diff(prev.srtt, rtt);
                let rttvar = (prev.rttvar * 3 + diff) / 4;
                let srtt = (prev.srtt * 7 + rtt) / 8;
                Smoothed { srtt, rttvar }
            }
        });
    }

    /// Records a Karn back-off for `path`: the last retransmit timeout
    /// observed, used as the RTO until a clean (non-retransmitted)
    /// sample clears it.
    pub fn backoff(&mut self, now: Timepoint, path: Path, duration: Duration) {
        self.clear_outdated(now);
        let record = self.paths.entry(path).or_insert(PathRecord {
            last_update: now,
            smooth: None,
            backoff: None,
        });
        record.last_update = now;
        record.backoff = Some(duration);
    }

    /// Drops any path record whose `last_update` is older than
    /// `history_duration`. Called from the two mutating entry points so
    /// `paths` never accumulates records for addresses the client has
    /// stopped talking to.
    fn clear_outdated(&mut self, now: Timepoint) {
        let max_age = self.history_duration.as_micros() as i64;
        self.paths.retain(|_, record| now - record.last_update < max_age);
    }
}

fn abs_diff(a: Duration, b: Duration) -> Duration {
    if a > b {
        a - b
    } else {
        b - a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    fn path() -> Path {
        Path::new(
            IpAddr::from([192, 168, 0, 1]),
            IpAddr::from([192, 168, 0, 2]),
        )
    }

    #[test]
    fn unseen_path_uses_initial_rto() {
        let calc = RtoCalculator::new(Duration::from_millis(500), Duration::from_secs(3600));
        assert_eq!(calc.rto(&path()), Duration::from_millis(500));
    }

    #[test]
    fn first_sample_sets_srtt_and_half_rttvar() {
        let mut calc = RtoCalculator::new(Duration::from_millis(500), Duration::from_secs(3600));
        let now = Timepoint::epoch();
        calc.new_rtt(now, path(), Duration::from_millis(100));
        let record = calc.paths.get(&path()).unwrap();
        let smooth = record.smooth.unwrap();
        assert_eq!(smooth.srtt, Duration::from_millis(100));
        assert_eq!(smooth.rttvar, Duration::from_millis(50));
    }

    #[test]
    fn second_sample_applies_rfc6298_smoothing() {
        let mut calc = RtoCalculator::new(Duration::from_millis(500), Duration::from_secs(3600));
        let now = Timepoint::epoch();
        calc.new_rtt(now, path(), Duration::from_millis(100));
        calc.new_rtt(now, path(), Duration::from_millis(140));
        let record = calc.paths.get(&path()).unwrap();
        let smooth = record.smooth.unwrap();
        // RTTVAR = 3/4*50ms + 1/4*|100-140|ms = 37.5ms + 10ms = 47.5ms
        assert_eq!(smooth.rttvar, Duration::from_micros(47_500));
        // SRTT = 7/8*100ms + 1/8*140ms = 87.5ms + 17.5ms = 105ms
        assert_eq!(smooth.srtt, Duration::from_millis(105));
    }

    #[test]
    fn backoff_overrides_smoothed_rto_until_cleared() {
        let mut calc = RtoCalculator::new(Duration::from_millis(500), Duration::from_secs(3600));
        let now = Timepoint::epoch();
        calc.new_rtt(now, path(), Duration::from_millis(100));
        calc.backoff(now, path(), Duration::from_secs(3));
        assert_eq!(calc.rto(&path()), Duration::from_secs(3));
        calc.new_rtt(now, path(), Duration::from_millis(120));
        assert_ne!(calc.rto(&path()), Duration::from_secs(3));
    }

    #[test]
    fn stale_path_is_pruned_and_falls_back_to_initial_rto() {
        let mut calc = RtoCalculator::new(Duration::from_millis(500), Duration::from_secs(60));
        let t0 = Timepoint::epoch();
        calc.new_rtt(t0, path(), Duration::from_millis(100));
        assert_eq!(calc.paths.len(), 1);

        let t1 = t0.advance(Duration::from_secs(120));
        let other = Path::new(
            IpAddr::from([10, 0, 0, 1]),
            IpAddr::from([10, 0, 0, 2]),
        );
        calc.new_rtt(t1, other, Duration::from_millis(50));

        assert!(!calc.paths.contains_key(&path()));
        assert_eq!(calc.rto(&path()), Duration::from_millis(500));
    }
}
