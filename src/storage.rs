use std::collections::VecDeque;

/// Fixed-capacity FIFO history. The oldest entry is evicted when a push would
/// exceed capacity, so `len() <= capacity()` always holds.
///
/// The buffer itself is not synchronized; the monitor keeps it behind the same
/// lock as the alert state so readers never observe a half-applied update.
#[derive(Clone, Debug)]
pub struct HistoryBuffer<T> {
    capacity: usize,
    inner: VecDeque<T>,
}

impl<T: Clone> HistoryBuffer<T> {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.inner.len() >= self.capacity {
            // Trim oldest to make room.
            self.inner.pop_front();
        }
        self.inner.push_back(item);
        debug_assert!(self.inner.len() <= self.capacity);
    }

    pub fn latest(&self) -> Option<&T> {
        self.inner.back()
    }

    /// The last `n` entries, oldest first. Returns fewer when fewer exist.
    pub fn recent(&self, n: usize) -> Vec<T> {
        let len = self.inner.len();
        let take = n.min(len);
        self.inner.iter().skip(len - take).cloned().collect()
    }

    pub fn all(&self) -> Vec<T> {
        self.inner.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_to_capacity() {
        let mut buf = HistoryBuffer::new(3);
        buf.push(1);
        buf.push(2);
        buf.push(3);
        buf.push(4);
        let hist = buf.all();
        assert_eq!(hist, vec![2, 3, 4]);
        assert_eq!(buf.latest(), Some(&4));
    }

    #[test]
    fn keeps_last_capacity_items_in_order() {
        let mut buf = HistoryBuffer::new(100);
        for i in 0..250 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 100);
        let expected: Vec<i32> = (150..250).collect();
        assert_eq!(buf.all(), expected);
    }

    #[test]
    fn recent_returns_tail_oldest_first() {
        let mut buf = HistoryBuffer::new(10);
        for i in 0..6 {
            buf.push(i);
        }
        assert_eq!(buf.recent(3), vec![3, 4, 5]);
        assert_eq!(buf.recent(0), Vec::<i32>::new());
    }

    #[test]
    fn recent_does_not_pad_short_history() {
        let mut buf = HistoryBuffer::new(10);
        buf.push("a");
        buf.push("b");
        assert_eq!(buf.recent(5), vec!["a", "b"]);
        let empty: HistoryBuffer<u8> = HistoryBuffer::new(4);
        assert!(empty.recent(5).is_empty());
        assert!(empty.latest().is_none());
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut buf = HistoryBuffer::new(0);
        buf.push(1);
        buf.push(2);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.all(), vec![2]);
    }
}
