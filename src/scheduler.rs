//! Cancellable one-shot and repeating timers on a virtual clock.
//!
//! The clock only moves when the owner drains due tasks, which keeps every
//! timer-driven loop deterministic under test. Handles are never reused, so
//! cancelling a handle that already fired (or was already cancelled) is a
//! harmless no-op.

use std::collections::HashMap;
use std::time::Duration;

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    seq: u64, // breaks ties between equal due times, in scheduling order
    period: Option<Duration>,
    task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    entries: HashMap<TimerHandle, Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            entries: HashMap::new(),
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        self.insert(delay, None, task)
    }

    pub fn schedule_repeating(&mut self, period: Duration, task: T) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        self.insert(period, Some(period), task)
    }

    /// Returns whether a pending timer was actually removed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    #[cfg(test)]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Removes the earliest task due at or before `until` and moves the clock to
    /// its due time. Repeating tasks are put back one period later.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerHandle, T)> {
        let (&handle, _) = self
            .entries
            .iter()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.seq))?;
        let entry = self.entries.remove(&handle)?;
        self.now = self.now.max(entry.due);
        if let Some(period) = entry.period {
            let seq = self.bump_seq();
            self.entries.insert(
                handle,
                Entry {
                    due: entry.due + period,
                    seq,
                    period: Some(period),
                    task: entry.task.clone(),
                },
            );
        }
        Some((handle, entry.task))
    }

    /// Moves the clock forward once nothing else is due.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.entries.insert(handle, Entry { due: self.now + delay, seq, period, task });
        handle
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// Cancels whatever the slot holds and empties it.
pub fn cancel_slot<T: Clone>(scheduler: &mut Scheduler<T>, slot: &mut Option<TimerHandle>) {
    if let Some(handle) = slot.take() {
        scheduler.cancel(handle);
    }
}
