//! # Memory Layout

/// Size of one physical frame (and one virtual page) in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// log2([`PAGE_SIZE`]); the number of in-page offset bits.
pub const PAGE_SHIFT: u32 = 12;

/// Physical address the kernel image is loaded at (QEMU `virt` RAM base).
pub const KERNEL_BASE: u64 = 0x8000_0000;

/// First physical address past the end of RAM.
pub const PHYS_TOP: u64 = KERNEL_BASE + 128 * 1024 * 1024;

/// Upper bound on the number of processors (harts) the kernel supports.
pub const MAX_CPUS: usize = 8;

/// One past the highest user virtual address.
///
/// This is one bit less than the Sv39 maximum, which avoids having to
/// sign-extend virtual addresses that have the high bit set.
pub const MAX_VA: u64 = 1 << (9 + 9 + 9 + 12 - 1);

/// Byte pattern written over every frame handed out by the allocator.
pub const ALLOC_FILL: u8 = 0x05;

/// Byte pattern written over every frame returned to a free pool.
pub const SCRUB_FILL: u8 = 0x01;

const _: () = {
    assert!(PAGE_SIZE == 1 << PAGE_SHIFT);
    assert!(KERNEL_BASE.is_multiple_of(PAGE_SIZE));
    assert!(PHYS_TOP.is_multiple_of(PAGE_SIZE));
    assert!(PHYS_TOP > KERNEL_BASE);
    assert!(MAX_CPUS > 0);
    assert!(ALLOC_FILL != SCRUB_FILL, "sentinels must be distinguishable");
};
