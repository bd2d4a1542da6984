use crate::{PAGE_SHIFT, PhysicalAddress};
use core::fmt;

/// Identity of one physical frame: its base address divided by the frame size.
///
/// Frames are never created or destroyed at runtime; a `FrameNumber` only names
/// one. Whether the named frame is free, exclusively owned or shared is tracked
/// by the frame allocator.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::*;
/// let frame = FrameNumber::new(0x80010);
/// assert_eq!(frame.base(), PhysicalAddress::new(0x8001_0000));
/// assert_eq!(FrameNumber::from_aligned(frame.base()), Some(frame));
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrameNumber(u64);

impl FrameNumber {
    #[inline]
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The frame that contains `pa` (the offset bits are dropped).
    #[inline]
    #[must_use]
    pub const fn containing(pa: PhysicalAddress) -> Self {
        Self(pa.as_u64() >> PAGE_SHIFT)
    }

    /// The frame whose base is exactly `pa`, or `None` if `pa` is not frame aligned.
    #[inline]
    #[must_use]
    pub const fn from_aligned(pa: PhysicalAddress) -> Option<Self> {
        if pa.is_frame_aligned() {
            Some(Self::containing(pa))
        } else {
            None
        }
    }

    /// Physical base address of the frame.
    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 << PAGE_SHIFT)
    }

    /// Physical base address, or `None` if the frame lies past the top of the
    /// 64-bit physical address space.
    #[inline]
    #[must_use]
    pub const fn checked_base(self) -> Option<PhysicalAddress> {
        if self.0 > u64::MAX >> PAGE_SHIFT {
            None
        } else {
            Some(self.base())
        }
    }

    /// The frame `n` frames after this one.
    #[inline]
    #[must_use]
    pub const fn add_frames(self, n: u64) -> Self {
        Self(self.0 + n)
    }

    /// Distance in frames from `origin` to `self`, or `None` if `self` lies below `origin`.
    #[inline]
    #[must_use]
    pub const fn checked_distance_from(self, origin: Self) -> Option<u64> {
        self.0.checked_sub(origin.0)
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame(0x{:X})", self.0)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#0x{:X}", self.0)
    }
}
