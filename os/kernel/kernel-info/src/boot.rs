//! # Kernel Boot Information

use crate::memory::{KERNEL_BASE, PAGE_SIZE, PHYS_TOP};

/// Physical memory handed to the frame allocator by the early boot path.
///
/// The range is half-open, `[usable_start, usable_end)`. Neither end needs to
/// be frame aligned; consumers round inwards.
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BootMemory {
    /// First usable physical byte, typically the end of the kernel image.
    pub usable_start: u64,

    /// One past the last usable physical byte.
    pub usable_end: u64,

    /// Number of processors that will run kernel code.
    pub cpus: usize,
}

impl BootMemory {
    #[must_use]
    pub const fn new(usable_start: u64, usable_end: u64, cpus: usize) -> Self {
        Self {
            usable_start,
            usable_end,
            cpus,
        }
    }

    /// Everything from the end of the kernel image up to [`PHYS_TOP`].
    ///
    /// `kernel_end` is the linker-provided end symbol.
    #[must_use]
    pub const fn after_kernel(kernel_end: u64, cpus: usize) -> Self {
        let start = if kernel_end < KERNEL_BASE {
            KERNEL_BASE
        } else {
            kernel_end
        };
        Self::new(start, PHYS_TOP, cpus)
    }

    /// Number of whole frames inside the usable range.
    #[must_use]
    pub const fn usable_frames(&self) -> u64 {
        let first = self.usable_start.div_ceil(PAGE_SIZE);
        let last = self.usable_end / PAGE_SIZE;
        last.saturating_sub(first)
    }

    /// Bytes covered by [`usable_frames`](Self::usable_frames).
    #[must_use]
    pub const fn usable_bytes(&self) -> u64 {
        self.usable_frames() * PAGE_SIZE
    }
}
