//! An in-memory page table for hosted runs.

use crate::{MapError, PageEntryBits, PageTable};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use kernel_info::memory::MAX_VA;
use kernel_memory_addresses::{FrameNumber, VirtualAddress, VirtualPage};
use log::trace;

/// Leaf entries keyed by virtual page.
///
/// Every page ever mapped keeps a slot, so a cleared page still has an
/// (invalid) entry to look up, as it would in a real table.
/// Invalidations are logged until [`take_invalidated`](Self::take_invalidated)
/// drains them.
#[derive(Clone, Debug, Default)]
pub struct SoftPageTable {
    entries: BTreeMap<VirtualPage, PageEntryBits>,
    invalidated: Vec<VirtualPage>,
}

impl SoftPageTable {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            invalidated: Vec::new(),
        }
    }

    /// Store `entry` for the page containing `va` as is, bypassing every check.
    pub fn set_entry(&mut self, va: VirtualAddress, entry: PageEntryBits) {
        self.entries.insert(va.page(), entry);
    }

    /// Valid entries in address order.
    pub fn mappings(&self) -> impl Iterator<Item = (VirtualPage, PageEntryBits)> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| e.valid())
            .map(|(&page, &e)| (page, e))
    }

    /// Pages whose translation was invalidated, oldest first.
    #[must_use]
    pub fn invalidated(&self) -> &[VirtualPage] {
        &self.invalidated
    }

    /// Hand over the recorded invalidations and start a fresh log.
    pub fn take_invalidated(&mut self) -> Vec<VirtualPage> {
        core::mem::take(&mut self.invalidated)
    }
}

impl PageTable for SoftPageTable {
    fn lookup_entry(&self, va: VirtualAddress) -> Option<PageEntryBits> {
        self.entries.get(&va.page()).copied()
    }

    fn entry_mut(&mut self, va: VirtualAddress) -> Option<&mut PageEntryBits> {
        self.entries.get_mut(&va.page())
    }

    fn install_mapping(
        &mut self,
        va: VirtualAddress,
        frame: FrameNumber,
        flags: PageEntryBits,
    ) -> Result<(), MapError> {
        if va.as_u64() >= MAX_VA {
            return Err(MapError::OutOfRange(va));
        }
        let page = va.page();
        if self.entries.get(&page).is_some_and(PageEntryBits::valid) {
            return Err(MapError::AlreadyMapped(page));
        }
        trace!("map {page} -> {frame}");
        self.entries.insert(page, flags.with_frame(frame).with_valid(true));
        Ok(())
    }

    fn clear_entry(&mut self, va: VirtualAddress) -> Option<PageEntryBits> {
        let slot = self.entries.get_mut(&va.page())?;
        let old = core::mem::replace(slot, PageEntryBits::new());
        old.valid().then_some(old)
    }

    fn invalidate(&mut self, va: VirtualAddress) {
        self.invalidated.push(va.page());
    }
}
