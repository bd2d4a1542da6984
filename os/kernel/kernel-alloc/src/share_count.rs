//! # Share Counts
//!
//! One counter per managed frame, recording how many owners (page table
//! entries, in-flight kernel users) currently hold the frame. A frame goes back
//! to a free pool exactly when its count drops to zero.
//!
//! All counters sit behind one spin lock. The lock is held only for the
//! read-modify-write of a single counter and is never held while a pool lock
//! is taken.

use crate::config::FrameRange;
use crate::invariant::{InvariantViolation, halt};
use alloc::boxed::Box;
use alloc::vec;
use kernel_memory_addresses::FrameNumber;
use kernel_sync::SpinLock;

/// Owner counts for every frame of a [`FrameRange`].
///
/// The table only counts. Moving a frame in or out of a free pool is the
/// [`FrameAllocator`](crate::FrameAllocator)'s job; it only moves a count
/// off zero when a frame leaves a pool.
pub struct ShareCountTable {
    range: FrameRange,
    counts: SpinLock<Box<[u32]>>,
}

impl ShareCountTable {
    /// A table for `range` with every count at zero.
    #[must_use]
    pub fn new(range: FrameRange) -> Self {
        Self {
            range,
            counts: SpinLock::new("share-counts", vec![0; range.len()].into_boxed_slice()),
        }
    }

    #[must_use]
    pub const fn range(&self) -> FrameRange {
        self.range
    }

    /// Add one owner; returns the new count.
    ///
    /// Halts if `frame` is not managed or the counter would overflow.
    #[must_use = "the new count tells whether other owners exist"]
    #[track_caller]
    pub fn increment(&self, frame: FrameNumber) -> u32 {
        let slot = self.slot(frame);
        self.counts.with_lock(|counts| {
            let Some(count) = counts[slot].checked_add(1) else {
                halt(InvariantViolation::ShareCountOverflow(frame));
            };
            counts[slot] = count;
            count
        })
    }

    /// Remove one owner; returns the new count.
    ///
    /// Halts if `frame` is not managed or had no owners.
    #[must_use = "a count of zero means the caller must recycle the frame"]
    #[track_caller]
    pub fn decrement(&self, frame: FrameNumber) -> u32 {
        let slot = self.slot(frame);
        self.counts.with_lock(|counts| {
            let Some(count) = counts[slot].checked_sub(1) else {
                halt(InvariantViolation::ShareCountUnderflow(frame));
            };
            counts[slot] = count;
            count
        })
    }

    /// Current count. Only a snapshot: it may change as soon as the lock drops.
    #[must_use]
    #[track_caller]
    pub fn peek(&self, frame: FrameNumber) -> u32 {
        let slot = self.slot(frame);
        self.counts.with_lock(|counts| counts[slot])
    }

    /// Add an owner to a frame that already has one; returns the new count.
    ///
    /// Halts if the frame has no owners, since it then sits in a free pool.
    #[track_caller]
    pub(crate) fn share(&self, frame: FrameNumber) -> u32 {
        let slot = self.slot(frame);
        self.counts.with_lock(|counts| match counts[slot] {
            0 => halt(InvariantViolation::ShareOfFreeFrame(frame)),
            u32::MAX => halt(InvariantViolation::ShareCountOverflow(frame)),
            count => {
                counts[slot] = count + 1;
                count + 1
            }
        })
    }

    /// Give a frame that just left a free pool its first owner.
    #[track_caller]
    pub(crate) fn claim(&self, frame: FrameNumber) {
        let slot = self.slot(frame);
        self.counts.with_lock(|counts| {
            if counts[slot] != 0 {
                halt(InvariantViolation::FreeFrameReferenced {
                    frame,
                    count: counts[slot],
                });
            }
            counts[slot] = 1;
        });
    }

    #[track_caller]
    fn slot(&self, frame: FrameNumber) -> usize {
        self.range.index_of_managed(frame) as usize
    }
}

impl core::fmt::Debug for ShareCountTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShareCountTable")
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ShareCountTable {
        ShareCountTable::new(FrameRange::new(FrameNumber::new(0x100), 8))
    }

    #[test]
    fn counts_follow_increments_and_decrements() {
        let table = table();
        let frame = FrameNumber::new(0x103);
        assert_eq!(table.peek(frame), 0);
        assert_eq!(table.increment(frame), 1);
        assert_eq!(table.increment(frame), 2);
        assert_eq!(table.increment(frame), 3);
        assert_eq!(table.decrement(frame), 2);
        assert_eq!(table.peek(frame), 2);
        assert_eq!(table.peek(FrameNumber::new(0x104)), 0);
    }

    #[test]
    fn sharing_needs_an_owner() {
        let table = table();
        let frame = FrameNumber::new(0x101);
        table.claim(frame);
        assert_eq!(table.share(frame), 2);
        assert_eq!(table.peek(frame), 2);
    }

    #[test]
    #[should_panic(expected = "is free and cannot gain a share")]
    fn sharing_an_unowned_frame_halts() {
        let _ = table().share(FrameNumber::new(0x101));
    }

    #[test]
    fn claim_starts_at_one() {
        let table = table();
        let frame = FrameNumber::new(0x100);
        table.claim(frame);
        assert_eq!(table.peek(frame), 1);
    }

    #[test]
    #[should_panic(expected = "still has share count 1")]
    fn claiming_an_owned_frame_halts() {
        let table = table();
        let frame = FrameNumber::new(0x100);
        table.claim(frame);
        table.claim(frame);
    }

    #[test]
    #[should_panic(expected = "share count underflow")]
    fn underflow_halts() {
        let table = table();
        let _ = table.decrement(FrameNumber::new(0x101));
    }

    #[test]
    #[should_panic(expected = "outside managed range")]
    fn unmanaged_frame_halts() {
        let table = table();
        let _ = table.increment(FrameNumber::new(0x108));
    }
}
