use bitfield_struct::bitfield;
use kernel_memory_addresses::FrameNumber;

/// A single 64-bit RISC-V Sv39 page table entry in its raw bitfield form.
///
/// The type allows read/write access to individual bits without manual masking
/// or shifting, using the [`bitfield_struct`](https://docs.rs/bitfield-struct/)
/// derive.
///
/// ### Bit layout
///
/// | Bits   | Name  | Meaning |
/// |--------|-------|---------|
/// | 0      | `V`   | Valid entry if set |
/// | 1      | `R`   | Readable |
/// | 2      | `W`   | Writable |
/// | 3      | `X`   | Executable |
/// | 4      | `U`   | Accessible from user mode |
/// | 5      | `G`   | Global mapping |
/// | 6      | `A`   | Accessed |
/// | 7      | `D`   | Dirty |
/// | 8      | `RSW` | Copy-on-write marker (software) |
/// | 9      | `RSW` | Reserved for software |
/// | 10–53  | `PPN` | Physical frame number |
/// | 54–63  |       | Reserved, must be zero |
///
/// ### Notes
/// - An entry with none of `R`, `W`, `X` set points to the next table level;
///   otherwise it is a leaf.
/// - `W` without `R` is reserved by the architecture.
/// - The copy-on-write bit is ignored by hardware. A leaf with the bit set is
///   never writable; the first write traps and the fault resolver gives the
///   page a private copy.
///
/// ### Example
/// ```rust
/// # use kernel_memory_addresses::FrameNumber;
/// # use kernel_vmem::PageEntryBits;
/// let e = PageEntryBits::new()
///     .with_valid(true)
///     .with_readable(true)
///     .with_user(true)
///     .with_frame(FrameNumber::new(0x80123));
/// assert!(e.is_user_leaf());
/// assert_eq!(e.frame(), FrameNumber::new(0x80123));
/// ```
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PageEntryBits {
    /// Valid (V, bit 0).
    pub valid: bool,

    /// Readable (R, bit 1).
    pub readable: bool,

    /// Writable (W, bit 2).
    pub writable: bool,

    /// Executable (X, bit 3).
    pub executable: bool,

    /// User (U, bit 4).
    ///
    /// Set to allow user-mode access. Supervisor access to user pages is
    /// governed by `sstatus.SUM`.
    pub user: bool,

    /// Global (G, bit 5).
    pub global: bool,

    /// Accessed (A, bit 6).
    pub accessed: bool,

    /// Dirty (D, bit 7).
    pub dirty: bool,

    /// Copy-on-write (first RSW bit, bit 8).
    pub copy_on_write: bool,

    /// Second software bit (bit 9); unused.
    #[bits(1)]
    pub software: u8,

    /// Physical page number (bits 10..=53).
    #[bits(44)]
    ppn: u64,

    /// Reserved (bits 54..=63).
    #[bits(10)]
    __: u16,
}

impl PageEntryBits {
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> FrameNumber {
        FrameNumber::new(self.ppn())
    }

    #[inline]
    pub const fn set_frame(&mut self, frame: FrameNumber) {
        self.set_ppn(frame.as_u64());
    }

    #[inline]
    #[must_use]
    pub const fn with_frame(self, frame: FrameNumber) -> Self {
        self.with_ppn(frame.as_u64())
    }

    /// Whether the entry maps a page rather than pointing at a table.
    #[inline]
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.valid() && (self.readable() || self.writable() || self.executable())
    }

    /// A valid leaf that user mode may touch.
    #[inline]
    #[must_use]
    pub const fn is_user_leaf(&self) -> bool {
        self.is_leaf() && self.user()
    }

    /// The entry a shared page gets in both parent and child after a fork:
    /// read-only, and marked copy-on-write if it used to be writable.
    #[inline]
    #[must_use]
    pub const fn shared_copy_on_write(self) -> Self {
        if self.writable() {
            self.with_writable(false).with_copy_on_write(true)
        } else {
            self
        }
    }

    /// The entry after a copy-on-write fault gave the page a private `frame`.
    ///
    /// Every other bit is kept.
    #[inline]
    #[must_use]
    pub const fn privately_writable(self, frame: FrameNumber) -> Self {
        self.with_copy_on_write(false)
            .with_writable(true)
            .with_frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_sv39() {
        let e = PageEntryBits::new()
            .with_valid(true)
            .with_writable(true)
            .with_copy_on_write(true)
            .with_frame(FrameNumber::new(0x8_0001));
        assert_eq!(e.into_bits(), 1 | (1 << 2) | (1 << 8) | (0x8_0001 << 10));
        assert_eq!(PageEntryBits::from_bits(e.into_bits()).frame(), FrameNumber::new(0x8_0001));
    }

    #[test]
    fn table_pointers_are_not_leaves() {
        let e = PageEntryBits::new().with_valid(true).with_frame(FrameNumber::new(7));
        assert!(!e.is_leaf());
        assert!(!PageEntryBits::new().with_readable(true).is_leaf());
    }

    #[test]
    fn copy_on_write_round_trip_keeps_other_bits() {
        let writable = PageEntryBits::new()
            .with_valid(true)
            .with_readable(true)
            .with_writable(true)
            .with_user(true)
            .with_accessed(true)
            .with_frame(FrameNumber::new(0x100));

        let shared = writable.shared_copy_on_write();
        assert!(!shared.writable());
        assert!(shared.copy_on_write());
        assert_eq!(shared.frame(), writable.frame());

        let private = shared.privately_writable(FrameNumber::new(0x200));
        assert_eq!(private, writable.with_frame(FrameNumber::new(0x200)));
    }

    #[test]
    fn read_only_pages_are_shared_as_is() {
        let ro = PageEntryBits::new()
            .with_valid(true)
            .with_readable(true)
            .with_user(true);
        assert_eq!(ro.shared_copy_on_write(), ro);
    }
}
