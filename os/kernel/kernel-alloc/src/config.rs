//! Allocator configuration and the managed frame range.

use crate::cpu::CpuId;
use crate::invariant::{InvariantViolation, halt};
use kernel_info::boot::BootMemory;
use kernel_info::memory::MAX_CPUS;
use kernel_memory_addresses::{FrameNumber, PAGE_SIZE, PhysicalAddress};

/// What the allocator is built from: a physical range and a processor count.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameAllocConfig {
    pub usable_start: PhysicalAddress,
    pub usable_end: PhysicalAddress,
    pub cpus: usize,
}

impl FrameAllocConfig {
    #[must_use]
    pub const fn new(usable_start: PhysicalAddress, usable_end: PhysicalAddress, cpus: usize) -> Self {
        Self {
            usable_start,
            usable_end,
            cpus,
        }
    }

    #[must_use]
    pub const fn from_boot(boot: &BootMemory) -> Self {
        Self::new(
            PhysicalAddress::new(boot.usable_start),
            PhysicalAddress::new(boot.usable_end),
            boot.cpus,
        )
    }

    /// `count` frames starting at the frame that begins at `start`.
    #[must_use]
    pub const fn with_frames(start: FrameNumber, count: u64, cpus: usize) -> Self {
        Self::new(start.base(), start.add_frames(count).base(), cpus)
    }

    /// Validate the configuration and compute the managed frames.
    ///
    /// The start is rounded up and the end rounded down to frame boundaries.
    ///
    /// # Errors
    /// See [`ConfigError`].
    pub fn frames(&self) -> Result<FrameRange, ConfigError> {
        if self.cpus == 0 {
            return Err(ConfigError::NoProcessors);
        }
        if self.cpus > MAX_CPUS {
            return Err(ConfigError::TooManyProcessors {
                requested: self.cpus,
                max: MAX_CPUS,
            });
        }

        let first = self.usable_start.as_u64().div_ceil(PAGE_SIZE);
        let end = self.usable_end.as_u64() / PAGE_SIZE;
        let count = end.saturating_sub(first);
        if count == 0 {
            return Err(ConfigError::NoUsableFrames {
                start: self.usable_start,
                end: self.usable_end,
            });
        }
        let count = u32::try_from(count).map_err(|_| ConfigError::TooManyFrames { count })?;
        Ok(FrameRange::new(FrameNumber::new(first), count))
    }
}

impl From<BootMemory> for FrameAllocConfig {
    fn from(boot: BootMemory) -> Self {
        Self::from_boot(&boot)
    }
}

/// Boot configuration problems. These are reported, not fatal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no usable frames between {start} and {end}")]
    NoUsableFrames {
        start: PhysicalAddress,
        end: PhysicalAddress,
    },
    #[error("at least one processor is required")]
    NoProcessors,
    #[error("{requested} processors requested, at most {max} supported")]
    TooManyProcessors { requested: usize, max: usize },
    #[error("{count} frames exceed the free-stack index space")]
    TooManyFrames { count: u64 },
    #[error("frame memory does not cover frames {first}..{end}")]
    MemoryNotCovered { first: FrameNumber, end: FrameNumber },
    #[error("boot processor {0} is outside the configured processors")]
    BootCpuOutOfRange(CpuId),
}

/// A contiguous run of managed frames.
///
/// Frames are addressed internally by their index in the run, which keeps
/// every per-frame table a plain array.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FrameRange {
    first: FrameNumber,
    count: u32,
}

impl FrameRange {
    #[must_use]
    pub const fn new(first: FrameNumber, count: u32) -> Self {
        Self { first, count }
    }

    #[must_use]
    pub const fn first(&self) -> FrameNumber {
        self.first
    }

    /// One past the last managed frame.
    #[must_use]
    pub fn end(&self) -> FrameNumber {
        self.first.add_frames(u64::from(self.count))
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.count as usize
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub fn contains(&self, frame: FrameNumber) -> bool {
        self.index_of(frame).is_some()
    }

    /// Position of `frame` in the run, if managed.
    #[must_use]
    pub fn index_of(&self, frame: FrameNumber) -> Option<u32> {
        frame
            .checked_distance_from(self.first)
            .and_then(|d| u32::try_from(d).ok())
            .filter(|&index| index < self.count)
    }

    /// Position of `frame` in the run; halts if the frame is not managed.
    #[must_use]
    #[track_caller]
    pub fn index_of_managed(&self, frame: FrameNumber) -> u32 {
        self.index_of(frame).unwrap_or_else(|| {
            halt(InvariantViolation::FrameOutOfRange {
                frame,
                first: self.first,
                end: self.end(),
            })
        })
    }

    #[must_use]
    pub fn frame_at(&self, index: u32) -> FrameNumber {
        debug_assert!(index < self.count);
        self.first.add_frames(u64::from(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = FrameNumber> + use<> {
        let first = self.first;
        (0..u64::from(self.count)).map(move |i| first.add_frames(i))
    }
}
