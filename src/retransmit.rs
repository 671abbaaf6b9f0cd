use std::time::Duration;

use crate::clock::Timepoint;

/// Per-transaction retransmit timer schedule and 5xx retransmit budget
/// (RFC 6298 exponential back-off plus the RFC 8489 final-wait
/// multiplier).
///
/// Grounded on the `RetransmitAlgo` class embedded in the original's
/// `stun_client_udp.cpp`.
#[derive(Debug, Clone)]
pub struct RetransmitAlgo {
    initial_rto: Duration,
    request_count: u32,
    retransmission_multiplier: u32,
    max_rto: Option<Duration>,
    server_error_timeout: Option<Duration>,
    server_error_max_retransmits: u32,
    maybe_next: Option<Timepoint>,
    last_timeout: Duration,
    rtx_count: u32,
    fivexx_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Process5xxResult {
    RetransmitScheduled,
    TransactionFailed,
}

impl RetransmitAlgo {
    pub fn new(
        initial_rto: Duration,
        request_count: u32,
        retransmission_multiplier: u32,
        max_rto: Option<Duration>,
        server_error_timeout: Option<Duration>,
        server_error_max_retransmits: u32,
        now: Timepoint,
    ) -> Self {
        Self {
            initial_rto,
            request_count,
            retransmission_multiplier,
            max_rto,
            server_error_timeout,
            server_error_max_retransmits,
            maybe_next: Some(now.advance(initial_rto)),
            last_timeout: initial_rto,
            rtx_count: 0,
            fivexx_count: 0,
        }
    }

    /// Schedules the first wakeup at `now + initial_rto`.
    pub fn init(&mut self, now: Timepoint) -> Option<Timepoint> {
        self.maybe_next = Some(now.advance(self.last_timeout));
        self.maybe_next
    }

    /// If the current wakeup has fired, schedules and returns the next
    /// one (applying the final-wait multiplier or doubling, per RFC
    /// 8489), or `None` once the retransmit budget is exhausted.
    pub fn next(&mut self, now: Timepoint) -> Option<Timepoint> {
        let time_for_next = match self.maybe_next {
            Some(next) => !now.is_before(&next),
            None => false,
        };
        if time_for_next {
            let (maybe_next, timeout) = self.calc_next(now);
            self.maybe_next = maybe_next;
            if maybe_next.is_some() {
                self.rtx_count += 1;
                self.last_timeout = timeout;
            }
        }
        self.maybe_next
    }

    /// Responds to a 5xx error response: schedules a retransmit if
    /// `server_error_timeout` is configured and the budget isn't spent,
    /// else declares the transaction failed.
    pub fn process_5xx(&mut self, now: Timepoint) -> Process5xxResult {
        match self.server_error_timeout {
            Some(timeout) => {
                if self.fivexx_count >= self.server_error_max_retransmits {
                    return Process5xxResult::TransactionFailed;
                }
                self.fivexx_count += 1;
                self.maybe_next = Some(now.advance(timeout));
                Process5xxResult::RetransmitScheduled
            }
            None => Process5xxResult::TransactionFailed,
        }
    }

    pub fn last_timeout(&self) -> Duration {
        self.last_timeout
    }

    pub fn rtx_count(&self) -> u32 {
        self.rtx_count
    }

    fn calc_next(&self, now: Timepoint) -> (Option<Timepoint>, Duration) {
        if self.rtx_count + 1 >= self.request_count + self.fivexx_count {
            return (None, Duration::from_secs(0));
        }
        let current = if self.rtx_count + 2 == self.request_count {
            self.initial_rto * self.retransmission_multiplier
        } else {
            self.last_timeout * 2
        };
        let timeout = match self.max_rto {
            Some(max_rto) => current.max(max_rto),
            None => current,
        };
        (Some(now.advance(timeout)), timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn algo(now: Timepoint) -> RetransmitAlgo {
        RetransmitAlgo::new(Duration::from_millis(100), 3, 16, None, None, 0, now)
    }

    #[test]
    fn exhausts_after_request_count_wakeups() {
        let t0 = Timepoint::epoch();
        let mut rtx = algo(t0);

        // wakeup #1 at t=100ms
        let t1 = t0.advance(Duration::from_millis(100));
        let next = rtx.next(t1).unwrap();
        assert_eq!(next, t1.advance(Duration::from_millis(200)));

        // wakeup #2 at t=300ms: rtx_count+2 == request_count (3) -> final wait
        let t2 = next;
        let next = rtx.next(t2).unwrap();
        assert_eq!(next, t2.advance(Duration::from_millis(100) * 16));

        // wakeup #3: budget exhausted
        let t3 = next;
        assert_eq!(rtx.next(t3), None);
    }

    #[test]
    fn max_rto_acts_as_a_floor_on_the_doubled_timeout() {
        // Mirrors the original: `max_rto` is taken via std::max against
        // the computed timeout, so it floors rather than caps it.
        let t0 = Timepoint::epoch();
        let mut rtx = RetransmitAlgo::new(
            Duration::from_millis(100),
            10,
            16,
            Some(Duration::from_secs(1)),
            None,
            0,
            t0,
        );
        let t1 = t0.advance(Duration::from_millis(100));
        let next = rtx.next(t1).unwrap();
        assert_eq!(next, t1.advance(Duration::from_secs(1)));
    }

    #[test]
    fn five_xx_schedules_within_its_own_budget() {
        let t0 = Timepoint::epoch();
        let mut rtx = RetransmitAlgo::new(
            Duration::from_millis(100),
            3,
            16,
            None,
            Some(Duration::from_millis(500)),
            1,
            t0,
        );
        assert_eq!(rtx.process_5xx(t0), Process5xxResult::RetransmitScheduled);
        assert_eq!(rtx.process_5xx(t0), Process5xxResult::TransactionFailed);
    }

    #[test]
    fn no_server_error_timeout_fails_immediately() {
        let t0 = Timepoint::epoch();
        let mut rtx = algo(t0);
        assert_eq!(rtx.process_5xx(t0), Process5xxResult::TransactionFailed);
    }
}
