//! Bounded FIFO ring
//!
//! Appending past the bound hands the oldest element back to the caller
//! instead of dropping it, so owners can recycle evicted values.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct BoundedRing<T> {
    items: VecDeque<T>,
    bound: usize,
}

impl<T> BoundedRing<T> {
    pub fn new(bound: usize) -> Self {
        let bound = bound.max(1);
        Self {
            items: VecDeque::new(),
            bound,
        }
    }

    /// Append to the back. Returns the evicted front element if the bound
    /// was exceeded.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);
        if self.items.len() > self.bound {
            self.items.pop_front()
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Remove every element, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut ring = BoundedRing::new(3);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.push(3), None);
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.push(5), Some(2));

        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn drain_empties_in_order() {
        let mut ring = BoundedRing::new(4);
        for i in 0..4 {
            ring.push(i);
        }
        let drained: Vec<_> = ring.drain().collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
        assert!(ring.is_empty());
    }

    #[test]
    fn zero_bound_is_clamped() {
        let mut ring = BoundedRing::new(0);
        assert_eq!(ring.bound(), 1);
        assert_eq!(ring.push('a'), None);
        assert_eq!(ring.push('b'), Some('a'));
    }
}
