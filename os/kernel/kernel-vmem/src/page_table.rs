//! # Page Table Interface
//!
//! The fault resolver and the fork helpers only ever touch leaf entries of a
//! user address space. [`PageTable`] is that narrow view; the kernel backs it
//! with an Sv39 walk, hosted runs with [`SoftPageTable`](crate::SoftPageTable).

use crate::PageEntryBits;
use kernel_memory_addresses::{FrameNumber, VirtualAddress, VirtualPage};

/// Installing a mapping failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("page {0} is already mapped")]
    AlreadyMapped(VirtualPage),
    #[error("address {0} is outside the user address space")]
    OutOfRange(VirtualAddress),
    #[error("no memory for an intermediate page table")]
    NoTableMemory,
}

pub trait PageTable {
    /// The leaf entry for the page containing `va`.
    ///
    /// `None` when no slot exists for the page. A returned entry may still be
    /// invalid.
    fn lookup_entry(&self, va: VirtualAddress) -> Option<PageEntryBits>;

    /// The existing leaf slot for the page containing `va`.
    fn entry_mut(&mut self, va: VirtualAddress) -> Option<&mut PageEntryBits>;

    /// Map the page containing `va` to `frame` with the permission bits of
    /// `flags`. The frame field of `flags` is ignored and `V` is always set.
    ///
    /// # Errors
    /// The page is already validly mapped, `va` lies outside the user address
    /// space, or an intermediate table could not be allocated.
    fn install_mapping(
        &mut self,
        va: VirtualAddress,
        frame: FrameNumber,
        flags: PageEntryBits,
    ) -> Result<(), MapError>;

    /// Clear the entry for the page containing `va`; returns it if it was valid.
    fn clear_entry(&mut self, va: VirtualAddress) -> Option<PageEntryBits>;

    /// Drop any cached translation for `va` after its entry changed.
    fn invalidate(&mut self, va: VirtualAddress) {
        let _ = va;
    }
}
