//! Bounded queue for ROS depth QoS behavior.
//!
//! When full, the OLDEST element is dropped, as ROS 2 history depth does.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

pub struct BoundedQueue<T> {
    data: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    /// usize::MAX = unlimited (KeepAll)
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            not_empty: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Push an item, dropping the OLDEST if at capacity.
    ///
    /// Returns `true` if an item was dropped.
    pub fn push(&self, item: T) -> bool {
        let mut data = self.data.lock();
        let dropped = if data.len() >= self.capacity {
            data.pop_front();
            true
        } else {
            false
        };
        data.push_back(item);
        self.not_empty.notify_one();
        dropped
    }

    /// `None` if nothing arrived within `timeout`.
    ///
    /// A timeout too large to express as a deadline waits without limit.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut data = self.data.lock();
        while data.is_empty() {
            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut data, deadline).timed_out() {
                        break;
                    }
                }
                None => self.not_empty.wait(&mut data),
            }
        }
        data.pop_front()
    }

    pub fn try_recv(&self) -> Option<T> {
        self.data.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_drops_oldest_when_full() {
        let queue = BoundedQueue::new(2);
        assert!(!queue.push(1));
        assert!(!queue.push(2));
        assert!(queue.push(3));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_recv(), Some(2));
        assert_eq!(queue.try_recv(), Some(3));
        assert_eq!(queue.try_recv(), None);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let queue = BoundedQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.try_recv(), Some("b"));
    }

    #[test]
    fn test_recv_timeout() {
        let queue = Arc::new(BoundedQueue::new(4));
        assert_eq!(queue.recv_timeout(Duration::from_millis(10)), None);

        let producer = queue.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.push(7);
        });
        assert_eq!(queue.recv_timeout(Duration::from_secs(5)), Some(7));
        handle.join().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_recv_with_unbounded_timeout() {
        let queue = Arc::new(BoundedQueue::new(4));
        queue.push(1);
        assert_eq!(queue.recv_timeout(Duration::MAX), Some(1));

        let producer = queue.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            producer.push(2);
        });
        assert_eq!(queue.recv_timeout(Duration::MAX), Some(2));
        handle.join().unwrap();
    }
}
