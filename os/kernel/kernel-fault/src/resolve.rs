//! # Fault Resolution
//!
//! Two kinds of user page fault are repaired here:
//!
//! - **Lazy mapping**: the first touch of a page in a file-backed region gets
//!   a zeroed frame filled from the file and mapped with the region's rights.
//! - **Copy-on-write**: a write to a page shared after a fork gets a private
//!   copy; the faulting process's entry is rewritten and its share of the old
//!   frame is dropped.
//!
//! Everything else is an invalid access. A failed resolution never leaks a
//! frame and never leaves a half-written entry behind.

use crate::classify::{FaultClass, classify};
use crate::error::{FaultError, InvalidAccess};
use crate::process::{Access, UserProcess};
use kernel_alloc::{CurrentCpu, FrameAllocator, FrameMemory};
use kernel_memory_addresses::{FrameNumber, VirtualAddress};
use kernel_vmem::{PageEntryBits, PageTable, Vma};
use log::{debug, warn};

/// How a fault was repaired.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Resolution {
    /// A file-backed page was mapped to this frame.
    Mapped(FrameNumber),
    /// A copy-on-write page now has a private frame.
    Copied { from: FrameNumber, to: FrameNumber },
    /// The page was writable already, e.g. when a kernel write to user memory
    /// probes a page that needs no repair.
    AlreadyWritable,
}

pub struct FaultResolver<'a, M, C> {
    frames: &'a FrameAllocator<M, C>,
}

impl<'a, M, C> FaultResolver<'a, M, C>
where
    M: FrameMemory,
    C: CurrentCpu,
{
    #[must_use]
    pub const fn new(frames: &'a FrameAllocator<M, C>) -> Self {
        Self { frames }
    }

    /// Repair the fault `access` at `va` in `process`.
    ///
    /// The caller runs on the processor that took the trap, with the process
    /// locked against concurrent changes to its page table.
    ///
    /// # Errors
    /// Any [`FaultError`]; the caller terminates the process.
    pub fn resolve_fault<P: UserProcess>(
        &self,
        process: &mut P,
        va: VirtualAddress,
        access: Access,
    ) -> Result<Resolution, FaultError> {
        let outcome = match classify(process, va, access) {
            FaultClass::LazyMap(region) => self.map_from_file(process, va, &region),
            FaultClass::CopyOnWrite(entry) => self.copy_on_write(process, va, entry),
            FaultClass::AlreadyWritable => Ok(Resolution::AlreadyWritable),
            FaultClass::Invalid(reason) => Err(reason.into()),
        };

        match &outcome {
            Ok(resolution) => debug!("pid {}: {access:?} fault at {va}: {resolution:?}", process.pid()),
            Err(error) => warn!("pid {}: {access:?} fault at {va}: {error}", process.pid()),
        }
        outcome
    }

    fn map_from_file<P: UserProcess>(
        &self,
        process: &mut P,
        va: VirtualAddress,
        region: &Vma<P::File>,
    ) -> Result<Resolution, FaultError> {
        let page = va.page();
        let offset = region
            .file_offset_for(page)
            .ok_or(FaultError::FileOffsetOverflow(page.base()))?;
        let frame = self.frames.allocate()?;

        // SAFETY: the frame was just allocated and is not mapped anywhere.
        let bytes = unsafe { self.frames.memory().frame_mut(frame) };
        bytes.fill(0);

        #[allow(clippy::cast_possible_truncation)]
        let expected = region.bytes_in_page(page) as usize;
        match process.read_file(region.file(), offset, &mut bytes[..expected]) {
            Ok(read) if read == expected => {}
            Ok(read) => return Err(self.discard(frame, FaultError::ShortRead { expected, read })),
            Err(error) => return Err(self.discard(frame, error.into())),
        }

        let flags = region.protection().user_leaf_bits();
        process
            .page_table_mut()
            .install_mapping(page.base(), frame, flags)
            .map_err(|error| self.discard(frame, error.into()))?;
        Ok(Resolution::Mapped(frame))
    }

    fn copy_on_write<P: UserProcess>(
        &self,
        process: &mut P,
        va: VirtualAddress,
        entry: PageEntryBits,
    ) -> Result<Resolution, FaultError> {
        let old = entry.frame();
        let _ = self.frames.frame_range().index_of_managed(old);
        let new = self.frames.allocate()?;

        // SAFETY: `new` is ours alone. `old` is read-only in every mapping of
        // it and this process holds one of its shares until the free below.
        unsafe {
            let memory = self.frames.memory();
            memory.frame_mut(new).copy_from_slice(memory.frame_ref(old));
        }

        let table = process.page_table_mut();
        let Some(slot) = table.entry_mut(va) else {
            return Err(self.discard(new, InvalidAccess::NotMapped.into()));
        };
        *slot = entry.privately_writable(new);
        table.invalidate(va);

        let _ = self.frames.free(old);
        Ok(Resolution::Copied { from: old, to: new })
    }

    fn discard(&self, frame: FrameNumber, error: FaultError) -> FaultError {
        let _ = self.frames.free(frame);
        error
    }
}
