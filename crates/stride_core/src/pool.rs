//! Reusable object pool
//!
//! A bounded free list of reset values. Values are moved out on
//! [`Pool::acquire`] and moved back in on [`Pool::release`], so a value is
//! owned by exactly one holder at a time: the pool or its caller.

use tracing::trace;

/// Values that can be recycled by a [`Pool`].
pub trait Reusable: Default {
    /// Return the value to its zeroed state without freeing its storage.
    fn reset(&mut self);
}

/// Lifetime counters for a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values currently parked in the free list.
    pub free: usize,
    /// Maximum number of values the free list retains.
    pub capacity: usize,
    /// Values built because the free list was empty.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    /// Values handed back and parked.
    pub recycled: u64,
    /// Values handed back while the free list was full.
    pub dropped: u64,
}

pub struct Pool<T> {
    free: Vec<T>,
    capacity: usize,
    created: u64,
    reused: u64,
    recycled: u64,
    dropped: u64,
}

impl<T: Reusable> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            created: 0,
            reused: 0,
            recycled: 0,
            dropped: 0,
        }
    }

    /// Pre-allocate up to `count` values (never beyond capacity).
    pub fn prewarm(&mut self, count: usize) {
        let target = count.min(self.capacity);
        while self.free.len() < target {
            self.free.push(T::default());
        }
    }

    /// Take a reset value. Never blocks and never fails: an empty free list
    /// builds a fresh value.
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(value) => {
                self.reused += 1;
                value
            }
            None => {
                self.created += 1;
                T::default()
            }
        }
    }

    /// Reset a value and park it, or drop it if the free list is full.
    pub fn release(&mut self, mut value: T) {
        if self.free.len() >= self.capacity {
            self.dropped += 1;
            trace!(capacity = self.capacity, "pool full, dropping released value");
            return;
        }
        value.reset();
        self.free.push(value);
        self.recycled += 1;
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shrink or grow the retention cap, dropping surplus parked values.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.free.truncate(capacity);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free.len(),
            capacity: self.capacity,
            created: self.created,
            reused: self.reused,
            recycled: self.recycled,
            dropped: self.dropped,
        }
    }
}
