#![forbid(unsafe_code)]

//! Deterministic deferred-effect scheduling.
//!
//! The controller's only suspension points are timer deferrals: focusing into
//! a freshly opened panel, hiding a panel after its close transition, and
//! restoring focus after that. [`Scheduler`] models them over a virtual clock
//! the host advances explicitly, so every ordering the live host can produce
//! is reproducible in a test.
//!
//! # Invariants
//!
//! - Effects fire in (due time, schedule order) — two effects due at the same
//!   instant pop in the order they were scheduled.
//! - `advance` never fires an effect early; `run_until_idle` fires everything.
//! - The scheduler itself never cancels anything. Staleness is the payload's
//!   concern: the controller stamps each payload with the epoch that
//!   scheduled it and drops mismatches on delivery.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use web_time::Duration;

struct Entry<T> {
    due: Duration,
    seq: u64,
    payload: T,
}

// BinaryHeap is a max-heap; invert so the earliest (due, seq) pops first.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

/// A virtual-clock timer queue for deferred effects.
pub struct Scheduler<T> {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Entry<T>>,
}

impl<T> core::fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .finish()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler at virtual time zero.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of effects not yet due.
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether no effects are pending.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Due time of the earliest pending effect, if any.
    #[inline]
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|e| e.due)
    }

    /// Schedule `payload` to fire after `delay`.
    pub fn schedule(&mut self, delay: Duration, payload: T) {
        let entry = Entry {
            due: self.now + delay,
            seq: self.seq,
            payload,
        };
        self.seq += 1;
        self.queue.push(entry);
    }

    /// Advance the clock by `dt` and return every effect that came due, in
    /// firing order.
    pub fn advance(&mut self, dt: Duration) -> Vec<T> {
        self.now += dt;
        let mut fired = Vec::new();
        while let Some(head) = self.queue.peek() {
            if head.due > self.now {
                break;
            }
            fired.push(self.queue.pop().expect("peeked entry exists").payload);
        }
        fired
    }

    /// Advance the clock to the last pending deadline and return everything.
    pub fn run_until_idle(&mut self) -> Vec<T> {
        let horizon = self
            .queue
            .iter()
            .map(|e| e.due)
            .max()
            .unwrap_or(self.now);
        if horizon > self.now {
            self.advance(horizon - self.now)
        } else {
            self.advance(Duration::ZERO)
        }
    }
}
