//! Index-linked free stacks.
//!
//! Every managed frame owns one link slot in a shared [`FreeLinks`] table.
//! A [`FreeStack`] is a head index plus a length; pushing threads the frame
//! through its link slot. Because the links live outside the frames, a free
//! frame's contents stay untouched after scrubbing and frames can move
//! between stacks without any per-stack storage.
//!
//! A frame is on at most one stack at a time; the caller's locking guarantees
//! that, and with it exclusive use of the frame's link slot.

use alloc::boxed::Box;
use core::sync::atomic::{AtomicU32, Ordering};

/// Terminates a stack.
const NIL: u32 = u32::MAX;

pub struct FreeLinks {
    next: Box<[AtomicU32]>,
}

impl FreeLinks {
    pub fn new(frames: u32) -> Self {
        Self {
            next: (0..frames).map(|_| AtomicU32::new(NIL)).collect(),
        }
    }

    #[inline]
    fn slot(&self, index: u32) -> &AtomicU32 {
        &self.next[index as usize]
    }
}

#[derive(Debug)]
pub struct FreeStack {
    head: u32,
    len: usize,
}

impl Default for FreeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FreeStack {
    pub const fn new() -> Self {
        Self { head: NIL, len: 0 }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.head == NIL
    }

    pub fn push(&mut self, links: &FreeLinks, index: u32) {
        debug_assert_ne!(index, NIL);
        links.slot(index).store(self.head, Ordering::Relaxed);
        self.head = index;
        self.len += 1;
    }

    pub fn pop(&mut self, links: &FreeLinks) -> Option<u32> {
        if self.is_empty() {
            return None;
        }
        let index = self.head;
        self.head = links.slot(index).swap(NIL, Ordering::Relaxed);
        self.len -= 1;
        Some(index)
    }

    /// Visit the stack from top to bottom.
    pub fn for_each(&self, links: &FreeLinks, mut f: impl FnMut(u32)) {
        let mut cursor = self.head;
        while cursor != NIL {
            f(cursor);
            cursor = links.slot(cursor).load(Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifo() {
        let links = FreeLinks::new(4);
        let mut stack = FreeStack::new();
        stack.push(&links, 1);
        stack.push(&links, 3);
        stack.push(&links, 0);
        assert_eq!(stack.len(), 3);

        let mut seen = Vec::new();
        stack.for_each(&links, |i| seen.push(i));
        assert_eq!(seen, [0, 3, 1]);

        assert_eq!(stack.pop(&links), Some(0));
        assert_eq!(stack.pop(&links), Some(3));
        assert_eq!(stack.pop(&links), Some(1));
        assert_eq!(stack.pop(&links), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn frames_migrate_between_stacks() {
        let links = FreeLinks::new(3);
        let mut a = FreeStack::new();
        let mut b = FreeStack::new();
        for i in 0..3 {
            a.push(&links, i);
        }

        let moved = a.pop(&links).unwrap();
        b.push(&links, moved);

        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
        assert_eq!(b.pop(&links), Some(2));
        assert_eq!(a.pop(&links), Some(1));
        assert_eq!(a.pop(&links), Some(0));
    }
}
