use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::clock::Timepoint;

use super::handle::Handle;

/// One scheduled wakeup: a transaction's handle and the time it's next
/// due. Ordered by time first, then by handle ascending, so pops are
/// strictly monotonic in scheduled time with a deterministic tie-break
/// when two wakeups land at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Item {
    at: Timepoint,
    handle: Handle,
}

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.at == other.at {
            self.handle.cmp(&other.handle)
        } else if self.at.is_after(&other.at) {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Across-all-transactions priority queue of pending retransmit
/// wakeups. Stale entries — a handle no longer in the transaction
/// table, because the transaction already finished — are simply
/// skipped by the caller on pop rather than removed eagerly.
#[derive(Debug, Clone, Default)]
pub(crate) struct Timeline {
    heap: BinaryHeap<Reverse<Item>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: Timepoint, handle: Handle) {
        self.heap.push(Reverse(Item { at, handle }));
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The time of the next scheduled wakeup, if any.
    pub fn peek_time(&self) -> Option<Timepoint> {
        self.heap.peek().map(|Reverse(item)| item.at)
    }

    /// Pops the next wakeup if it has already fired (its time is not
    /// after `now`).
    pub fn pop_due(&mut self, now: Timepoint) -> Option<Handle> {
        match self.heap.peek() {
            Some(Reverse(item)) if !item.at.is_after(&now) => {
                let Reverse(item) = self.heap.pop().unwrap();
                Some(item.handle)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(v: u64) -> Handle {
        Handle(v)
    }

    #[test]
    fn pops_earliest_first() {
        let mut tl = Timeline::new();
        let t0 = Timepoint::epoch();
        tl.push(t0.advance(std::time::Duration::from_millis(200)), h(0));
        tl.push(t0.advance(std::time::Duration::from_millis(100)), h(1));
        let now = t0.advance(std::time::Duration::from_secs(1));
        assert_eq!(tl.pop_due(now), Some(h(1)));
        assert_eq!(tl.pop_due(now), Some(h(0)));
        assert_eq!(tl.pop_due(now), None);
    }

    #[test]
    fn ties_break_on_smaller_handle_first() {
        let mut tl = Timeline::new();
        let t0 = Timepoint::epoch();
        tl.push(t0, h(5));
        tl.push(t0, h(2));
        assert_eq!(tl.pop_due(t0), Some(h(2)));
        assert_eq!(tl.pop_due(t0), Some(h(5)));
    }

    #[test]
    fn nothing_due_before_its_time() {
        let mut tl = Timeline::new();
        let t0 = Timepoint::epoch();
        tl.push(t0.advance(std::time::Duration::from_millis(500)), h(0));
        assert_eq!(tl.pop_due(t0), None);
        assert_eq!(
            tl.peek_time(),
            Some(t0.advance(std::time::Duration::from_millis(500)))
        );
    }
}
