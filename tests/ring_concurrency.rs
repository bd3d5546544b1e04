use std::sync::Arc;
use std::thread;

use trend::pipeline::PipelineState;
use trend::ring::RingBuffer;

const HISTORY: usize = 64;
const PUSHES: u64 = 200_000;

/// A snapshot taken after `count` pushes of 0, 1, 2, ... must hold exactly
/// the last `HISTORY` of them, oldest first, padded with NaN at the front.
fn assert_consistent(values: &[f64], count: u64) {
    for (slot, value) in values.iter().enumerate() {
        let index = count as i64 - HISTORY as i64 + slot as i64;
        if index < 0 {
            assert!(value.is_nan(), "slot {slot} should be undefined at count {count}");
        } else {
            assert_eq!(*value, index as f64, "slot {slot} at count {count}");
        }
    }
}

#[test]
fn snapshots_never_tear_under_concurrent_pushes() {
    let ring = Arc::new(RingBuffer::new(HISTORY));
    let writer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for i in 0..PUSHES {
                ring.push(i as f64);
            }
        })
    };

    let mut values = vec![0.0; HISTORY];
    let mut last_count = 0;
    while last_count < PUSHES {
        let count = ring.snapshot(&mut values);
        assert!(count >= last_count, "push count went backwards");
        assert_consistent(&values, count);
        last_count = count;
    }
    writer.join().unwrap();
    assert_eq!(ring.push_count(), PUSHES);
}

#[test]
fn damage_signal_covers_every_push() {
    let state = Arc::new(PipelineState::new(2, HISTORY));
    let producer = {
        let state = Arc::clone(&state);
        thread::spawn(move || {
            for i in 0..10_000u64 {
                for ring in state.channels() {
                    ring.push(i as f64);
                }
                state.mark_damaged();
            }
        })
    };
    producer.join().unwrap();

    assert!(state.take_damage().is_some());
    assert!(state.take_damage().is_none());
    let mut values = vec![0.0; HISTORY];
    for ring in state.channels() {
        let count = ring.snapshot(&mut values);
        assert_eq!(count, 10_000);
        assert_consistent(&values, count);
    }
}
