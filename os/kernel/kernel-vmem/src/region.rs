//! # Memory-Mapped Regions
//!
//! A [`Vma`] describes one file-backed range of a process's address space.
//! Pages inside it start out unmapped and are filled from the file on first
//! touch.

use crate::PageEntryBits;
use bitflags::bitflags;
use kernel_memory_addresses::{PAGE_SIZE, VirtualAddress, VirtualPage};

bitflags! {
    /// Access rights requested for a region.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Protection: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
    }
}

impl Protection {
    /// Leaf permission bits for a user page with these rights (`U` and `V` set).
    #[must_use]
    pub const fn user_leaf_bits(self) -> PageEntryBits {
        PageEntryBits::new()
            .with_valid(true)
            .with_user(true)
            .with_readable(self.contains(Self::READ))
            .with_writable(self.contains(Self::WRITE))
            .with_executable(self.contains(Self::EXEC))
    }
}

/// A file-backed virtual memory area.
///
/// ### Invariants
/// - `start` is page aligned; `len` need not be a page multiple.
/// - `start + len` does not overflow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Vma<F> {
    start: VirtualPage,
    len: u64,
    file: F,
    file_offset: u64,
    prot: Protection,
}

impl<F> Vma<F> {
    /// # Panics
    /// Panics if `start + len` overflows.
    #[must_use]
    pub fn new(start: VirtualPage, len: u64, file: F, file_offset: u64, prot: Protection) -> Self {
        assert!(
            start.base().as_u64().checked_add(len).is_some(),
            "region end overflows"
        );
        Self {
            start,
            len,
            file,
            file_offset,
            prot,
        }
    }

    #[must_use]
    pub const fn start(&self) -> VirtualPage {
        self.start
    }

    /// One past the last byte of the region.
    #[must_use]
    pub const fn end(&self) -> VirtualAddress {
        VirtualAddress::new(self.start.base().as_u64() + self.len)
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn file(&self) -> &F {
        &self.file
    }

    #[must_use]
    pub const fn file_offset(&self) -> u64 {
        self.file_offset
    }

    #[must_use]
    pub const fn protection(&self) -> Protection {
        self.prot
    }

    #[must_use]
    pub const fn contains(&self, va: VirtualAddress) -> bool {
        va.as_u64() >= self.start.base().as_u64() && va.as_u64() < self.end().as_u64()
    }

    /// File offset backing the first byte of `page`.
    ///
    /// `None` if `page` is outside the region or the file bytes backing it
    /// run past `u64::MAX`.
    #[must_use]
    pub fn file_offset_for(&self, page: VirtualPage) -> Option<u64> {
        let into_region = page.checked_offset_from(self.start)?;
        if into_region >= self.len {
            return None;
        }
        let offset = self.file_offset.checked_add(into_region)?;
        offset.checked_add(self.bytes_in_page(page))?;
        Some(offset)
    }

    /// How many bytes of `page` the region covers: a full page except at the
    /// region's tail.
    #[must_use]
    pub fn bytes_in_page(&self, page: VirtualPage) -> u64 {
        self.end()
            .as_u64()
            .saturating_sub(page.base().as_u64())
            .min(PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_addresses::FrameNumber;

    fn region() -> Vma<&'static str> {
        let start = VirtualPage::containing(VirtualAddress::new(0x4000_0000));
        Vma::new(start, 2 * PAGE_SIZE + 100, "file", 0x3000, Protection::READ)
    }

    #[test]
    fn bounds() {
        let vma = region();
        assert!(vma.contains(VirtualAddress::new(0x4000_0000)));
        assert!(vma.contains(VirtualAddress::new(0x4000_2063)));
        assert!(!vma.contains(VirtualAddress::new(0x4000_2064)));
        assert!(!vma.contains(VirtualAddress::new(0x3FFF_FFFF)));
    }

    #[test]
    fn offsets_and_tail() {
        let vma = region();
        let second = vma.start().add_pages(1);
        let tail = vma.start().add_pages(2);
        assert_eq!(vma.file_offset_for(vma.start()), Some(0x3000));
        assert_eq!(vma.file_offset_for(second), Some(0x4000));
        assert_eq!(vma.bytes_in_page(second), PAGE_SIZE);
        assert_eq!(vma.bytes_in_page(tail), 100);
    }

    #[test]
    fn offsets_outside_the_region_or_file_are_refused() {
        let vma = region();
        assert_eq!(vma.file_offset_for(vma.start().add_pages(3)), None);
        let below = VirtualPage::containing(VirtualAddress::new(0x3FFF_F000));
        assert_eq!(vma.file_offset_for(below), None);

        let near_end = Vma::new(vma.start(), 2 * PAGE_SIZE, "file", u64::MAX - PAGE_SIZE, Protection::READ);
        assert_eq!(near_end.file_offset_for(near_end.start()), Some(u64::MAX - PAGE_SIZE));
        assert_eq!(near_end.file_offset_for(near_end.start().add_pages(1)), None);
    }

    #[test]
    fn protection_to_bits() {
        let bits = (Protection::READ | Protection::EXEC)
            .user_leaf_bits()
            .with_frame(FrameNumber::new(1));
        assert!(bits.valid() && bits.user() && bits.readable() && bits.executable());
        assert!(!bits.writable());
        assert!(!bits.copy_on_write());
    }
}
