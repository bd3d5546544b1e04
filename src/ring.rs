use std::sync::{Mutex, PoisonError};

/// Fixed-capacity ring of samples written by the producer thread.
///
/// Every slot starts out as NaN so "no data yet" can be told apart from a
/// real zero. The push counter is monotonic and survives any number of wraps.
pub struct RingBuffer {
    inner: Mutex<RingInner>,
    capacity: usize,
}

struct RingInner {
    slots: Vec<f64>,
    /// Slot that receives the next push, which is also the oldest sample.
    head: usize,
    pushed: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "ring buffer needs at least two slots");
        Self {
            inner: Mutex::new(RingInner {
                slots: vec![f64::NAN; capacity],
                head: 0,
                pushed: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, value: f64) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let head = inner.head;
        inner.slots[head] = value;
        inner.head = (head + 1) % self.capacity;
        inner.pushed += 1;
    }

    /// Copy all slots oldest first into `dest` and return the push count at
    /// the time of the copy.
    pub fn snapshot(&self, dest: &mut [f64]) -> u64 {
        assert_eq!(dest.len(), self.capacity, "snapshot length mismatch");
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (newer, older) = inner.slots.split_at(inner.head);
        dest[..older.len()].copy_from_slice(older);
        dest[older.len()..].copy_from_slice(newer);
        inner.pushed
    }

    pub fn push_count(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pushed
    }
}
