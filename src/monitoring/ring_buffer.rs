use std::iter::Chain;
use std::slice::Iter;

/// Fixed-capacity circular container.
///
/// Once `capacity` items are held, every push overwrites the oldest one.
/// Pushing never fails; a zero-capacity buffer silently drops everything.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: Vec<T>,
    /// Slot the next push writes to. Once the buffer is full this is also
    /// the position of the oldest retained item.
    cursor: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }

        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            self.items[self.cursor] = item;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Retained items, oldest first.
    ///
    /// Before the first wrap `cursor == len`, so the leading half of the
    /// chain is empty and this degrades to a plain slice walk.
    pub fn iter(&self) -> Chain<Iter<'_, T>, Iter<'_, T>> {
        let split = self.cursor.min(self.items.len());
        let (newer, older) = self.items.split_at(split);
        older.iter().chain(newer.iter())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy of every retained item, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
