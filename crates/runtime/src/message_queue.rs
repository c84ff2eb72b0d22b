use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Deferred message queue for the single update thread.
///
/// Worker threads hold a cloneable [`MessagePoster`] and only ever append.
/// The owning thread calls [`MessageQueue::drain`] once per step and handles
/// the messages after the lock is released, so a handler that posts again
/// defers that message to the next step.
///
/// Ordering contract:
/// - Messages drain in posting order (FIFO across all posters).
#[derive(Debug)]
pub struct MessageQueue<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
}

/// Sending half of a [`MessageQueue`]; safe to move to other threads.
#[derive(Debug)]
pub struct MessagePoster<T> {
    inner: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Clone for MessagePoster<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poster(&self) -> MessagePoster<T> {
        MessagePoster {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn post(&self, message: T) {
        self.inner.lock().push_back(message);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Takes every pending message, leaving the queue empty.
    pub fn drain(&self) -> VecDeque<T> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl<T> MessagePoster<T> {
    pub fn post(&self, message: T) {
        self.inner.lock().push_back(message);
    }
}

#[cfg(test)]
mod tests {
    use super::MessageQueue;
    use std::thread;

    #[test]
    fn drains_in_posting_order() {
        let queue = MessageQueue::new();
        let poster = queue.poster();
        queue.post(1);
        poster.post(2);
        queue.post(3);

        let drained: Vec<_> = queue.drain().into_iter().collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn posts_during_handling_wait_for_next_drain() {
        let queue = MessageQueue::new();
        let poster = queue.poster();
        queue.post("first");

        let mut handled = Vec::new();
        for msg in queue.drain() {
            handled.push(msg);
            poster.post("follow-up");
        }
        assert_eq!(handled, vec!["first"]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain().pop_front(), Some("follow-up"));
    }

    #[test]
    fn worker_threads_can_post() {
        let queue = MessageQueue::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let poster = queue.poster();
                thread::spawn(move || {
                    for j in 0..10 {
                        poster.post(i * 10 + j);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("worker panicked");
        }

        let mut all: Vec<_> = queue.drain().into_iter().collect();
        all.sort_unstable();
        assert_eq!(all, (0..40).collect::<Vec<_>>());
    }
}
