//! Deciding what kind of fault happened.

use crate::error::InvalidAccess;
use crate::process::{Access, UserProcess};
use kernel_info::memory::MAX_VA;
use kernel_memory_addresses::{FrameNumber, VirtualAddress};
use kernel_vmem::{PageEntryBits, PageTable, Vma};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FaultClass<F> {
    /// First touch of a file-backed page.
    LazyMap(Vma<F>),
    /// Write to a shared copy-on-write page with this entry.
    CopyOnWrite(PageEntryBits),
    /// The page is already writable; the caller retries.
    AlreadyWritable,
    Invalid(InvalidAccess),
}

/// Classify a fault at `va` without changing anything.
///
/// The checks run in a fixed order; the first one that applies wins.
pub fn classify<P: UserProcess>(process: &P, va: VirtualAddress, access: Access) -> FaultClass<P::File> {
    use FaultClass::Invalid;

    if va.as_u64() >= MAX_VA {
        return Invalid(InvalidAccess::BeyondUserSpace);
    }

    let entry = process.page_table().lookup_entry(va).filter(PageEntryBits::valid);
    let region = process.lookup_region(va);
    match (region, entry) {
        (Some(region), None) => return FaultClass::LazyMap(region),
        (None, _) if va.as_u64() >= process.size() => return Invalid(InvalidAccess::BeyondImage),
        _ => {}
    }

    let Some(entry) = entry else {
        return Invalid(InvalidAccess::NotMapped);
    };
    if !entry.user() {
        return Invalid(InvalidAccess::SupervisorOnly);
    }
    if access != Access::Write {
        return Invalid(InvalidAccess::Protection);
    }
    if entry.writable() {
        return FaultClass::AlreadyWritable;
    }
    if !entry.copy_on_write() {
        return Invalid(InvalidAccess::ReadOnly);
    }
    if entry.frame() == FrameNumber::new(0) {
        return Invalid(InvalidAccess::NullFrame);
    }
    FaultClass::CopyOnWrite(entry)
}
