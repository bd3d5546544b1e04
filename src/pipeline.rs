use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::ring::RingBuffer;

/// State shared between the producer thread and the render loop.
///
/// The damage lock only guards the "new data" signal. Each ring buffer
/// carries its own lock for the bulk copy.
pub struct PipelineState {
    channels: Vec<RingBuffer>,
    /// Time of the first push since the last snapshot.
    damage: Mutex<Option<Instant>>,
    shutdown: AtomicBool,
}

impl PipelineState {
    pub fn new(channels: usize, history: usize) -> Self {
        assert!(channels >= 1, "pipeline needs at least one channel");
        Self {
            channels: (0..channels).map(|_| RingBuffer::new(history)).collect(),
            damage: Mutex::new(None),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn channels(&self) -> &[RingBuffer] {
        &self.channels
    }

    pub fn history(&self) -> usize {
        self.channels[0].capacity()
    }

    pub fn mark_damaged(&self) {
        let mut damage = self.damage.lock().unwrap_or_else(PoisonError::into_inner);
        if damage.is_none() {
            *damage = Some(Instant::now());
        }
    }

    /// Clear the damage signal, returning when it was first raised.
    pub fn take_damage(&self) -> Option<Instant> {
        self.damage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_is_taken_once() {
        let state = PipelineState::new(2, 4);
        assert!(state.take_damage().is_none());
        state.mark_damaged();
        let first = state.take_damage();
        assert!(first.is_some());
        assert!(state.take_damage().is_none());
    }

    #[test]
    fn damage_keeps_earliest_time() {
        let state = PipelineState::new(1, 4);
        state.mark_damaged();
        let before = Instant::now();
        state.mark_damaged();
        let since = state.take_damage().unwrap();
        assert!(since <= before);
    }

    #[test]
    fn channels_share_history() {
        let state = PipelineState::new(3, 7);
        assert_eq!(state.channels().len(), 3);
        assert_eq!(state.history(), 7);
        assert!(!state.is_shutdown());
        state.shutdown();
        assert!(state.is_shutdown());
    }
}
