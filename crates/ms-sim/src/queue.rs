//! `EventQueue`: the virtual-time priority queue.
//!
//! Events are keyed by `(due, seq)`.  `seq` is a monotonically increasing
//! insertion counter, so two events due at the same instant fire in the order
//! they were scheduled.  That stable FIFO tie-break is what makes a whole run
//! reproducible.
//!
//! Cancellation removes the entry by key; the map never holds dead events.

use std::collections::BTreeMap;

use ms_core::SimTime;

use crate::{SimError, SimResult};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
struct EventKey {
    due: SimTime,
    seq: u64,
}

/// Handle to a pending event, used to cancel it.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EventHandle(EventKey);

impl EventHandle {
    /// When the event is (or was) due.
    #[inline]
    pub fn due(&self) -> SimTime {
        self.0.due
    }

    /// Insertion sequence number; breaks ties between equal `due` times.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.0.seq
    }
}

/// A time-ordered queue of pending events carrying payload `E`.
pub struct EventQueue<E> {
    inner:    BTreeMap<EventKey, E>,
    next_seq: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self { inner: BTreeMap::new(), next_seq: 0 }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire `delay` units after `now`.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidDelay`] if `delay` is negative, NaN or infinite.
    pub fn schedule(&mut self, now: SimTime, delay: f64, payload: E) -> SimResult<EventHandle> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimError::InvalidDelay(delay));
        }
        Ok(self.schedule_at(now.after(delay), payload))
    }

    /// Schedule `payload` at an absolute instant the caller knows is valid.
    pub(crate) fn schedule_at(&mut self, due: SimTime, payload: E) -> EventHandle {
        let key = EventKey { due, seq: self.next_seq };
        self.next_seq += 1;
        self.inner.insert(key, payload);
        EventHandle(key)
    }

    /// Remove a pending event.  Returns its payload, or `None` if it already
    /// fired or was cancelled before.
    pub fn cancel(&mut self, handle: EventHandle) -> Option<E> {
        self.inner.remove(&handle.0)
    }

    /// `true` while the event behind `handle` is still pending.
    pub fn contains(&self, handle: EventHandle) -> bool {
        self.inner.contains_key(&handle.0)
    }

    /// Due time of the earliest pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.inner.keys().next().map(|k| k.due)
    }

    /// Remove and return the earliest pending event.
    pub fn pop_next(&mut self) -> Option<(EventHandle, E)> {
        self.inner.pop_first().map(|(key, payload)| (EventHandle(key), payload))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
