use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Cancellable timers over a virtual millisecond clock.
///
/// Timers that share a deadline fire in the order they were scheduled.
#[derive(Debug)]
pub struct TimerQueue<E> {
    pending: BTreeMap<(u64, u64), E>,
    next_seq: u64,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due_ms: u64, event: E) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((due_ms, seq), event);
        TimerId(seq)
    }

    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        let key = self
            .pending
            .keys()
            .find(|(_, seq)| *seq == id.0)
            .copied()?;
        self.pending.remove(&key)
    }

    /// Drops every pending timer and returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Removes the earliest timer whose deadline is at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, E)> {
        let (&(due, _), _) = self.pending.first_key_value()?;
        if due > now_ms {
            return None;
        }
        self.pending
            .pop_first()
            .map(|((due, _), event)| (due, event))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
