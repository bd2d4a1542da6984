//! Sharing pages between address spaces on fork, and dropping them again.
//!
//! A writable page becomes read-only and copy-on-write in both parent and
//! child. Read-only pages are shared as they are. Either way the frame gains
//! one owner per extra mapping, and loses it in [`release_page`].

use kernel_alloc::{CurrentCpu, FrameAllocator, FrameMemory, FreeOutcome};
use kernel_memory_addresses::{FrameNumber, VirtualAddress, VirtualPage};
use kernel_vmem::{MapError, PageEntryBits, PageTable};

/// Map the page at `va` of `parent` into `child` as well.
///
/// Returns the shared frame, or `None` if the parent has no valid mapping
/// there (a file-backed page nobody touched yet).
///
/// # Errors
/// `child` refused the mapping; the parent is left unchanged.
pub fn share_page<M, C, P, Q>(
    frames: &FrameAllocator<M, C>,
    parent: &mut P,
    child: &mut Q,
    va: VirtualAddress,
) -> Result<Option<FrameNumber>, MapError>
where
    M: FrameMemory,
    C: CurrentCpu,
    P: PageTable,
    Q: PageTable,
{
    let Some(entry) = parent.lookup_entry(va).filter(PageEntryBits::valid) else {
        return Ok(None);
    };

    let frame = entry.frame();
    let shared = entry.shared_copy_on_write();
    child.install_mapping(va, frame, shared)?;
    let _ = frames.increment_share(frame);

    if shared != entry
        && let Some(slot) = parent.entry_mut(va)
    {
        *slot = shared;
        parent.invalidate(va);
    }
    Ok(Some(frame))
}

/// Unmap the page at `va` and drop this mapping's share of its frame.
///
/// Returns `None` if nothing was mapped.
pub fn release_page<M, C, T>(
    frames: &FrameAllocator<M, C>,
    table: &mut T,
    va: VirtualAddress,
) -> Option<FreeOutcome>
where
    M: FrameMemory,
    C: CurrentCpu,
    T: PageTable,
{
    let entry = table.clear_entry(va)?;
    table.invalidate(va);
    Some(frames.free(entry.frame()))
}

/// [`share_page`] for `pages` consecutive pages starting at `start`.
///
/// Returns how many pages were shared. On error, every page already mapped
/// into `child` is released again.
///
/// # Errors
/// The first [`MapError`] from `child`.
pub fn share_range<M, C, P, Q>(
    frames: &FrameAllocator<M, C>,
    parent: &mut P,
    child: &mut Q,
    start: VirtualPage,
    pages: u64,
) -> Result<usize, MapError>
where
    M: FrameMemory,
    C: CurrentCpu,
    P: PageTable,
    Q: PageTable,
{
    let mut shared = 0;
    for i in 0..pages {
        let va = start.add_pages(i).base();
        match share_page(frames, parent, child, va) {
            Ok(Some(_)) => shared += 1,
            Ok(None) => {}
            Err(error) => {
                release_range(frames, child, start, i);
                return Err(error);
            }
        }
    }
    Ok(shared)
}

/// [`release_page`] for `pages` consecutive pages starting at `start`.
///
/// Returns how many frames went back to a free pool.
pub fn release_range<M, C, T>(
    frames: &FrameAllocator<M, C>,
    table: &mut T,
    start: VirtualPage,
    pages: u64,
) -> usize
where
    M: FrameMemory,
    C: CurrentCpu,
    T: PageTable,
{
    (0..pages)
        .filter_map(|i| release_page(frames, table, start.add_pages(i).base()))
        .filter(|outcome| *outcome == FreeOutcome::Recycled)
        .count()
}
