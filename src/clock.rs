use std::time::Duration;

const HALF_RANGE: u64 = u64::MAX / 2;

/// A monotonic, wraparound-safe instant at microsecond resolution.
///
/// Built on a plain `u64` microsecond counter rather than
/// `std::time::Instant` so the client state machine stays
/// platform-agnostic and replayable in tests: callers feed `Timepoint`
/// values in directly instead of reading a real clock. Ordering still
/// works correctly across a wrap of the counter (`is_after`/`is_before`
/// compare within half the counter's range), so a driver that resets
/// its clock to the epoch mid-run doesn't break timeline ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timepoint {
    micros: u64,
}

impl Timepoint {
    /// The zero instant.
    pub fn epoch() -> Self {
        Self { micros: 0 }
    }

    pub fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    pub fn as_micros(&self) -> u64 {
        self.micros
    }

    /// Advances by `duration`, wrapping on overflow.
    pub fn advance(&self, duration: Duration) -> Self {
        Self {
            micros: self.micros.wrapping_add(duration.as_micros() as u64),
        }
    }

    /// `true` if `self` is later than `other`, accounting for wraparound:
    /// the two instants are compared within half the counter's range.
    pub fn is_after(&self, other: &Self) -> bool {
        other.micros.wrapping_sub(self.micros) > HALF_RANGE
    }

    /// `true` if `self` is earlier than `other`.
    pub fn is_before(&self, other: &Self) -> bool {
        self.micros.wrapping_sub(other.micros) > HALF_RANGE
    }
}

impl std::ops::Sub for Timepoint {
    /// Signed duration in microseconds; negative if `self` is earlier
    /// than `rhs`.
    type Output = i64;

    fn sub(self, rhs: Self) -> i64 {
        if self.is_after(&rhs) {
            self.micros.wrapping_sub(rhs.micros) as i64
        } else {
            -(rhs.micros.wrapping_sub(self.micros) as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_forward() {
        let t0 = Timepoint::epoch();
        let t1 = t0.advance(Duration::from_millis(500));
        assert!(t1.is_after(&t0));
        assert!(!t0.is_after(&t1));
        assert_eq!(t1 - t0, 500_000);
        assert_eq!(t0 - t1, -500_000);
    }

    #[test]
    fn ordering_survives_wraparound() {
        let near_wrap = Timepoint::from_micros(u64::MAX - 10);
        let after_wrap = near_wrap.advance(Duration::from_micros(20));
        assert!(after_wrap.is_after(&near_wrap));
        assert!(near_wrap.is_before(&after_wrap));
    }

    #[test]
    fn equal_instants_are_neither_before_nor_after() {
        let t = Timepoint::from_micros(12345);
        assert!(!t.is_after(&t));
        assert!(!t.is_before(&t));
    }
}
