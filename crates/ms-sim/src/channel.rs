//! Delayed pub/sub channel.
//!
//! A channel is an append-only broadcast log.  `put` appends
//! `(now + delay, msg)`; a delivery event fires at `now + delay` and marks the
//! entry readable.  Because the delay is fixed per channel and virtual time
//! never goes backwards, entries become readable in exactly the order they
//! were written.
//!
//! Every subscriber owns a read cursor.  Reading never removes a message, so
//! each subscriber observes the full stream independently.  Subscribers that
//! ran ahead of the readable prefix are parked in a registry keyed by the
//! index they are waiting for; a delivery removes exactly that index's bucket.

use std::collections::{BTreeMap, HashMap};

use ms_core::{ProcessId, SimTime};

pub(crate) struct Channel<M> {
    delay:     f64,
    log:       Vec<(SimTime, M)>,
    /// Length of the readable prefix of `log`.
    delivered: usize,
    cursors:   HashMap<ProcessId, usize>,
    parked:    BTreeMap<usize, Vec<ProcessId>>,
}

impl<M: Clone> Channel<M> {
    pub(crate) fn new(delay: f64) -> Self {
        Self {
            delay,
            log:       Vec::new(),
            delivered: 0,
            cursors:   HashMap::new(),
            parked:    BTreeMap::new(),
        }
    }

    pub(crate) fn delay(&self) -> f64 {
        self.delay
    }

    /// Append a message; returns its log index and the instant it becomes readable.
    pub(crate) fn push(&mut self, now: SimTime, msg: M) -> (usize, SimTime) {
        let ready_at = now.after(self.delay);
        self.log.push((ready_at, msg));
        (self.log.len() - 1, ready_at)
    }

    /// Mark entry `index` readable and take the subscribers parked on it.
    pub(crate) fn deliver(&mut self, index: usize) -> Vec<ProcessId> {
        debug_assert_eq!(index, self.delivered, "channel deliveries out of order");
        self.delivered = self.delivered.max(index + 1);
        self.parked.remove(&index).unwrap_or_default()
    }

    /// Consume the next readable message for `pid`, if any.
    pub(crate) fn take_next(&mut self, pid: ProcessId) -> Option<M> {
        let cursor = self.cursors.entry(pid).or_insert(0);
        if *cursor >= self.delivered {
            return None;
        }
        let msg = self.log[*cursor].1.clone();
        *cursor += 1;
        Some(msg)
    }

    /// Register `pid` as waiting for the entry at its current cursor.
    pub(crate) fn park(&mut self, pid: ProcessId) {
        let cursor = *self.cursors.entry(pid).or_insert(0);
        self.parked.entry(cursor).or_default().push(pid);
    }

    pub(crate) fn len(&self) -> usize {
        self.log.len()
    }

    pub(crate) fn delivered(&self) -> usize {
        self.delivered
    }

    pub(crate) fn cursor(&self, pid: ProcessId) -> usize {
        self.cursors.get(&pid).copied().unwrap_or(0)
    }
}
