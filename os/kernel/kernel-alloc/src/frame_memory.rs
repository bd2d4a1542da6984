//! # Access to Frame Contents
//!
//! The allocator fills frames with sentinel bytes and the fault resolver
//! copies and zeroes them, so both need to turn a [`FrameNumber`] into bytes
//! they can touch. How that works depends on where the code runs:
//!
//! - In the kernel, physical memory is reachable at a fixed offset (identity
//!   mapped on RISC-V, a higher-half direct map elsewhere). See
//!   [`HhdmFrameMemory`].
//! - In hosted tests, frames live in a heap allocated, page aligned arena.
//!   See [`ArenaFrameMemory`].

use crate::config::{ConfigError, FrameRange};
use alloc::boxed::Box;
use core::cell::UnsafeCell;
use kernel_memory_addresses::{FrameNumber, PAGE_SIZE};

#[allow(clippy::cast_possible_truncation)]
pub const FRAME_BYTES: usize = PAGE_SIZE as usize;

/// The contents of one frame.
pub type FrameBytes = [u8; FRAME_BYTES];

/// Converts frame numbers into pointers usable from the current address space.
///
/// Producing a pointer is safe; dereferencing it is not. Whoever dereferences
/// must hold the frame (it was allocated to them, or they own a share of it)
/// and must not create a mutable reference while others may read.
pub trait FrameMemory: Sync {
    /// Whether [`frame_ptr`](Self::frame_ptr) may be called for `frame`.
    fn covers(&self, frame: FrameNumber) -> bool;

    /// Pointer to the first byte of `frame`.
    ///
    /// # Panics
    /// Implementations may panic if `frame` is not [covered](Self::covers).
    fn frame_ptr(&self, frame: FrameNumber) -> *mut FrameBytes;

    /// Shared view of a frame's contents.
    ///
    /// # Safety
    /// The caller must hold a share of `frame` for `'a`, and nobody may write
    /// to the frame during that time.
    #[inline]
    unsafe fn frame_ref<'a>(&self, frame: FrameNumber) -> &'a FrameBytes {
        unsafe { &*self.frame_ptr(frame) }
    }

    /// Exclusive view of a frame's contents.
    ///
    /// # Safety
    /// The caller must be the only holder of `frame` for `'a`.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn frame_mut<'a>(&self, frame: FrameNumber) -> &'a mut FrameBytes {
        unsafe { &mut *self.frame_ptr(frame) }
    }
}

impl<M: FrameMemory + ?Sized> FrameMemory for &M {
    #[inline]
    fn covers(&self, frame: FrameNumber) -> bool {
        (**self).covers(frame)
    }

    #[inline]
    fn frame_ptr(&self, frame: FrameNumber) -> *mut FrameBytes {
        (**self).frame_ptr(frame)
    }
}

/// Physical memory mapped linearly at `offset` in the kernel's address space.
///
/// # Safety
/// The mapping must exist for every frame the allocator manages.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HhdmFrameMemory {
    offset: u64,
}

impl HhdmFrameMemory {
    /// Physical address `pa` is visible at virtual address `offset + pa`.
    ///
    /// # Safety
    /// See the type documentation.
    #[must_use]
    pub const unsafe fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Physical and virtual addresses coincide.
    ///
    /// # Safety
    /// See the type documentation.
    #[must_use]
    pub const unsafe fn identity() -> Self {
        Self { offset: 0 }
    }
}

impl FrameMemory for HhdmFrameMemory {
    fn covers(&self, frame: FrameNumber) -> bool {
        frame
            .checked_base()
            .and_then(|base| base.as_u64().checked_add(PAGE_SIZE - 1))
            .and_then(|last| self.offset.checked_add(last))
            .is_some_and(|last| usize::try_from(last).is_ok())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn frame_ptr(&self, frame: FrameNumber) -> *mut FrameBytes {
        self.offset.wrapping_add(frame.base().as_u64()) as usize as *mut FrameBytes
    }
}

#[repr(C, align(4096))]
struct ArenaPage(UnsafeCell<FrameBytes>);

const _: () = assert!(align_of::<ArenaPage>() == FRAME_BYTES);

/// Heap backed frames for running the allocator outside the kernel.
///
/// Each frame is a separately aligned page in one boxed slice, so the arena
/// behaves like a window of physical memory starting at frame `first`.
pub struct ArenaFrameMemory {
    first: FrameNumber,
    pages: Box<[ArenaPage]>,
}

// SAFETY: the arena hands out raw pointers only; synchronising access to the
// bytes behind them is the job of whoever owns each frame.
unsafe impl Sync for ArenaFrameMemory {}
unsafe impl Send for ArenaFrameMemory {}

impl ArenaFrameMemory {
    /// `frames` zeroed frames starting at `first`.
    #[must_use]
    pub fn new(first: FrameNumber, frames: usize) -> Self {
        let pages = (0..frames)
            .map(|_| ArenaPage(UnsafeCell::new([0; FRAME_BYTES])))
            .collect();
        Self { first, pages }
    }

    /// An arena exactly covering `range`.
    #[must_use]
    pub fn for_range(range: FrameRange) -> Self {
        Self::new(range.first(), range.len())
    }

    /// An arena covering the frames `config` would manage.
    ///
    /// # Errors
    /// The configuration's own validation errors.
    pub fn for_config(config: &crate::FrameAllocConfig) -> Result<Self, ConfigError> {
        config.frames().map(Self::for_range)
    }

    #[must_use]
    pub fn first(&self) -> FrameNumber {
        self.first
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn slot(&self, frame: FrameNumber) -> Option<usize> {
        frame
            .checked_distance_from(self.first)
            .and_then(|d| usize::try_from(d).ok())
            .filter(|&i| i < self.pages.len())
    }
}

impl FrameMemory for ArenaFrameMemory {
    fn covers(&self, frame: FrameNumber) -> bool {
        self.slot(frame).is_some()
    }

    fn frame_ptr(&self, frame: FrameNumber) -> *mut FrameBytes {
        let Some(slot) = self.slot(frame) else {
            panic!("frame {frame} is outside the arena");
        };
        self.pages[slot].0.get()
    }
}

impl core::fmt::Debug for ArenaFrameMemory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArenaFrameMemory")
            .field("first", &self.first)
            .field("frames", &self.pages.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_map_refuses_frames_past_the_address_space() {
        let identity = unsafe { HhdmFrameMemory::identity() };
        let last = FrameNumber::new(u64::MAX >> kernel_memory_addresses::PAGE_SHIFT);
        assert!(identity.covers(FrameNumber::new(0x80000)));
        assert!(identity.covers(last));
        assert!(!identity.covers(last.add_frames(1)));
        assert!(!identity.covers(FrameNumber::new(u64::MAX)));

        let high = unsafe { HhdmFrameMemory::new(0xFFFF_FFC0_0000_0000) };
        assert!(high.covers(FrameNumber::new(0x80000)));
        assert!(!high.covers(FrameNumber::new(0x400_0000)));
    }

    #[test]
    fn arena_frames_are_page_aligned_and_distinct() {
        let arena = ArenaFrameMemory::new(FrameNumber::new(0x80000), 3);
        assert!(arena.covers(FrameNumber::new(0x80002)));
        assert!(!arena.covers(FrameNumber::new(0x80003)));
        assert!(!arena.covers(FrameNumber::new(0x7FFFF)));

        let a = arena.frame_ptr(FrameNumber::new(0x80000));
        let b = arena.frame_ptr(FrameNumber::new(0x80001));
        assert_eq!(a as usize % FRAME_BYTES, 0);
        assert_eq!(b as usize - a as usize, FRAME_BYTES);

        unsafe {
            arena.frame_mut(FrameNumber::new(0x80001)).fill(7);
            assert!(arena.frame_ref(FrameNumber::new(0x80000)).iter().all(|&b| b == 0));
            assert!(arena.frame_ref(FrameNumber::new(0x80001)).iter().all(|&b| b == 7));
        }
    }

    #[test]
    #[should_panic(expected = "outside the arena")]
    fn uncovered_frame_panics() {
        let arena = ArenaFrameMemory::new(FrameNumber::new(10), 1);
        let _ = arena.frame_ptr(FrameNumber::new(11));
    }

    #[test]
    fn direct_map_offsets() {
        let memory = unsafe { HhdmFrameMemory::new(0xFFFF_8000_0000_0000) };
        let ptr = memory.frame_ptr(FrameNumber::new(0x80000));
        assert_eq!(ptr as usize, 0xFFFF_8000_8000_0000);
    }
}
