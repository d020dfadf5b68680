//! Single-slot delivery buffer with conflate semantics.
//!
//! Every Riglink endpoint moves messages through a [`SlotQueue`]. In
//! conflate mode the queue holds at most one unconsumed message: a
//! second push before any pull discards the first (latest-wins).
//! This is what keeps a slow or dead peer from building up a backlog
//! of stale status updates or video frames — only the newest item is
//! ever worth delivering.
//!
//! In FIFO mode (conflate off) the queue keeps every message in push
//! order, for channels where each message matters.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::Notify;

/// A push/pull buffer shared between a producer and a single consumer.
///
/// Conflate property: pushing `m1` then `m2` with no intervening pull
/// means a subsequent pull yields `m2`, never `m1`. Order of survivors
/// is always push order.
pub struct SlotQueue<T> {
    conflate: bool,
    items: Mutex<VecDeque<T>>,
    notify: Notify,
}

impl<T> SlotQueue<T> {
    /// Creates a new queue. `conflate = true` keeps only the latest
    /// unconsumed item.
    pub fn new(conflate: bool) -> Self {
        Self {
            conflate,
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Enqueues an item, discarding any unconsumed items in conflate mode.
    pub fn push(&self, item: T) {
        {
            let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
            if self.conflate {
                items.clear();
            }
            items.push_back(item);
        }
        self.notify.notify_one();
    }

    /// Takes the next item without waiting.
    pub fn try_pull(&self) -> Option<T> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    /// Waits for and takes the next item.
    pub async fn pull(&self) -> T {
        loop {
            // Register interest before checking, so a push that lands
            // between the check and the await still wakes us.
            let notified = self.notify.notified();
            if let Some(item) = self.try_pull() {
                return item;
            }
            notified.await;
        }
    }

    /// Waits until an item is likely available, without taking it.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        if !self.is_empty() {
            return;
        }
        notified.await;
    }

    /// Returns `true` when no items are pending.
    pub fn is_empty(&self) -> bool {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflate_keeps_only_latest() {
        // Push m1, m2 before any pull — a single pull must yield m2.
        let queue = SlotQueue::new(true);
        queue.push("m1");
        queue.push("m2");
        assert_eq!(queue.try_pull(), Some("m2"));
        assert_eq!(queue.try_pull(), None);
    }

    #[test]
    fn test_fifo_keeps_all_in_order() {
        let queue = SlotQueue::new(false);
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.try_pull(), Some(1));
        assert_eq!(queue.try_pull(), Some(2));
        assert_eq!(queue.try_pull(), Some(3));
        assert_eq!(queue.try_pull(), None);
    }

    #[test]
    fn test_try_pull_empty_returns_none() {
        let queue: SlotQueue<u8> = SlotQueue::new(true);
        assert!(queue.try_pull().is_none());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_pull_wakes_on_push() {
        use std::sync::Arc;

        let queue = Arc::new(SlotQueue::new(true));
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pull().await })
        };

        // Give the consumer a chance to park first.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        queue.push(42u32);

        let got = consumer.await.expect("consumer task should complete");
        assert_eq!(got, 42);
    }

    #[tokio::test]
    async fn test_pull_returns_item_pushed_before_waiting() {
        let queue = SlotQueue::new(true);
        queue.push("early");
        assert_eq!(queue.pull().await, "early");
    }
}
