//! One-shot deadline queue for Skirmish room actors.
//!
//! A room owns a [`DeadlineQueue`] of its own timer keys and polls
//! [`DeadlineQueue::next_due`] next to its command channel. When the queue
//! is empty the future pends forever, so a quiet room costs nothing.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     let event = tokio::select! {
//!         cmd = cmd_rx.recv() => Event::Command(cmd),
//!         key = timers.next_due() => Event::Timer(key),
//!     };
//!     // handle `event` with full `&mut` access to the room
//! }
//! ```
//!
//! `next_due` only removes an entry once its deadline has passed, so
//! losing a `select!` race never drops a timer.
//!
//! # Staleness
//!
//! Scheduled work often outlives the state it was meant for. Tag each key
//! with a [`Generation`] value and compare on fire; bumping the generation
//! turns every older timer into a no-op without having to find and cancel
//! it.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

// ---------------------------------------------------------------------------
// Timer id
// ---------------------------------------------------------------------------

/// Handle to a scheduled entry, usable with [`DeadlineQueue::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// Ordered set of pending one-shot deadlines.
///
/// Entries with the same deadline fire in the order they were scheduled.
#[derive(Debug)]
pub struct DeadlineQueue<K> {
    entries: BTreeMap<(Instant, TimerId), K>,
    next_id: u64,
}

impl<K> Default for DeadlineQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DeadlineQueue<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Schedule `key` to fire `after` from now.
    pub fn schedule(&mut self, after: Duration, key: K) -> TimerId {
        self.schedule_at(Instant::now() + after, key)
    }

    /// Schedule `key` to fire at `deadline`. A deadline in the past fires
    /// on the next poll.
    pub fn schedule_at(&mut self, deadline: Instant, key: K) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.entries.insert((deadline, id), key);
        trace!(timer = id.0, pending = self.entries.len(), "deadline scheduled");
        id
    }

    /// Remove a single entry. Returns its key if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> Option<K> {
        let slot = self.entries.keys().find(|(_, entry)| *entry == id).copied()?;
        self.entries.remove(&slot)
    }

    /// Remove every entry whose key matches `pred`. Returns how many were
    /// removed.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, key| !pred(key));
        before - self.entries.len()
    }

    /// Drop every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Wait for the earliest deadline and return its key.
    ///
    /// Pends forever while the queue is empty. Cancel-safe.
    pub async fn next_due(&mut self) -> K {
        let Some(deadline) = self.next_deadline() else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;

        // Nothing can touch the queue between the sleep finishing and this
        // pop, so the first entry is still the one we slept for.
        match self.entries.pop_first() {
            Some(((_, id), key)) => {
                trace!(timer = id.0, pending = self.entries.len(), "deadline fired");
                key
            }
            None => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Monotonic counter used to invalidate timers scheduled for an earlier
/// phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn new() -> Self {
        Self(0)
    }

    /// The current value.
    pub fn current(&self) -> u64 {
        self.0
    }

    /// Advance to a new generation and return it.
    pub fn bump(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Whether `tag` was produced by the latest [`bump`](Self::bump).
    pub fn is_current(&self, tag: u64) -> bool {
        self.0 == tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_bump_invalidates_old_tags() {
        let mut generation = Generation::new();
        let first = generation.bump();
        assert!(generation.is_current(first));

        let second = generation.bump();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
        assert_eq!(generation.current(), 2);
    }

    #[test]
    fn test_cancel_returns_key_once() {
        let mut queue = DeadlineQueue::new();
        let id = queue.schedule(Duration::from_secs(1), "a");
        queue.schedule(Duration::from_secs(2), "b");

        assert_eq!(queue.cancel(id), Some("a"));
        assert_eq!(queue.cancel(id), None);
        assert_eq!(queue.len(), 1);
    }
}
