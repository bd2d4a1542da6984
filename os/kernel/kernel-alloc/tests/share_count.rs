use kernel_alloc::{FrameRange, ShareCountTable};
use kernel_memory_addresses::FrameNumber;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_increments_and_decrements_balance() {
    const THREADS: usize = 8;
    const ITERS: u32 = 10_000;

    let frame = FrameNumber::new(0x80000);
    let table = Arc::new(ShareCountTable::new(FrameRange::new(frame, 1)));
    let _ = table.increment(frame);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let table = Arc::clone(&table);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..ITERS {
                    assert!(table.increment(frame) >= 2);
                    assert!(table.decrement(frame) >= 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(table.peek(frame), 1);
}

#[test]
fn counts_are_per_frame() {
    let first = FrameNumber::new(0x200);
    let table = ShareCountTable::new(FrameRange::new(first, 3));
    let _ = table.increment(first.add_frames(1));
    let _ = table.increment(first.add_frames(1));
    assert_eq!(table.peek(first), 0);
    assert_eq!(table.peek(first.add_frames(1)), 2);
    assert_eq!(table.peek(first.add_frames(2)), 0);
    assert_eq!(table.range().count(), 3);
}
