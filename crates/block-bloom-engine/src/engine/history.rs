use std::collections::VecDeque;

/// Bounded undo stack.
///
/// Keeps a sliding window of the most recent entries: pushing onto a full
/// history discards the oldest entry first.
///
/// # Example
///
/// ```
/// use block_bloom_engine::engine::MoveHistory;
///
/// let mut history = MoveHistory::new(3);
/// for turn in 0..5 {
///     history.push(turn);
/// }
/// assert_eq!(history.pop(), Some(4));
/// assert_eq!(history.pop(), Some(3));
/// assert_eq!(history.pop(), Some(2));
/// assert_eq!(history.pop(), None);
/// ```
#[derive(Debug, Clone)]
pub struct MoveHistory<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> MoveHistory<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Removes and returns the most recent entry.
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
