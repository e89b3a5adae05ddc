//! Integration tests for the deadline queue.
//!
//! Time is paused, so sleeps resolve as soon as the runtime has nothing
//! else to do and the clock jumps straight to the next deadline.

use std::time::Duration;

use skirmish_timer::{DeadlineQueue, Generation};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Deadline { round: u64 },
    Reveal,
    Announce,
}

// =========================================================================
// Ordering
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_fires_in_deadline_order() {
    let mut queue = DeadlineQueue::new();
    queue.schedule(Duration::from_secs(5), Key::Reveal);
    queue.schedule(Duration::from_secs(10), Key::Deadline { round: 1 });
    queue.schedule(Duration::from_millis(100), Key::Announce);

    let start = Instant::now();
    assert_eq!(queue.next_due().await, Key::Announce);
    assert_eq!(start.elapsed(), Duration::from_millis(100));

    assert_eq!(queue.next_due().await, Key::Reveal);
    assert_eq!(start.elapsed(), Duration::from_secs(5));

    assert_eq!(queue.next_due().await, Key::Deadline { round: 1 });
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_equal_deadlines_fire_in_schedule_order() {
    let mut queue = DeadlineQueue::new();
    let at = Instant::now() + Duration::from_secs(1);
    queue.schedule_at(at, 1);
    queue.schedule_at(at, 2);
    queue.schedule_at(at, 3);

    assert_eq!(queue.next_due().await, 1);
    assert_eq!(queue.next_due().await, 2);
    assert_eq!(queue.next_due().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_past_deadline_fires_immediately() {
    let mut queue = DeadlineQueue::new();
    tokio::time::advance(Duration::from_secs(1)).await;
    queue.schedule_at(Instant::now() - Duration::from_millis(500), Key::Reveal);

    let start = Instant::now();
    assert_eq!(queue.next_due().await, Key::Reveal);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

// =========================================================================
// Empty queue
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_queue_pends_forever() {
    let mut queue: DeadlineQueue<Key> = DeadlineQueue::new();

    let result = tokio::time::timeout(Duration::from_secs(3600), queue.next_due()).await;
    assert!(result.is_err(), "empty queue must never fire");
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_where_removes_matching_keys() {
    let mut queue = DeadlineQueue::new();
    queue.schedule(Duration::from_secs(1), Key::Deadline { round: 1 });
    queue.schedule(Duration::from_secs(2), Key::Reveal);
    queue.schedule(Duration::from_secs(3), Key::Deadline { round: 2 });

    let removed = queue.cancel_where(|k| matches!(k, Key::Deadline { .. }));
    assert_eq!(removed, 2);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.next_due().await, Key::Reveal);
}

#[tokio::test(start_paused = true)]
async fn test_losing_select_race_keeps_entry() {
    let mut queue = DeadlineQueue::new();
    queue.schedule(Duration::from_secs(10), Key::Announce);

    // A shorter branch wins; the queue future is dropped mid-sleep.
    tokio::select! {
        _ = queue.next_due() => panic!("deadline fired early"),
        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
    }

    assert_eq!(queue.len(), 1);
    let start = Instant::now();
    assert_eq!(queue.next_due().await, Key::Announce);
    assert_eq!(start.elapsed(), Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_earlier_entry_added_after_poll_wins() {
    let mut queue = DeadlineQueue::new();
    queue.schedule(Duration::from_secs(10), Key::Deadline { round: 1 });

    tokio::select! {
        _ = queue.next_due() => panic!("deadline fired early"),
        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
    }
    queue.schedule(Duration::from_secs(2), Key::Reveal);

    assert_eq!(queue.next_due().await, Key::Reveal);
}

// =========================================================================
// Generations
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_stale_generation_is_detectable_on_fire() {
    let mut round = Generation::new();
    let mut queue = DeadlineQueue::new();

    let first = round.bump();
    queue.schedule(Duration::from_secs(10), Key::Deadline { round: first });

    // The round resolves early and a new one opens before the old timer fires.
    let second = round.bump();
    queue.schedule(Duration::from_secs(15), Key::Deadline { round: second });

    let Key::Deadline { round: tag } = queue.next_due().await else {
        panic!("expected a round deadline");
    };
    assert!(!round.is_current(tag));

    let Key::Deadline { round: tag } = queue.next_due().await else {
        panic!("expected a round deadline");
    };
    assert!(round.is_current(tag));
}
