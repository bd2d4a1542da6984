//! What the fault resolver needs from a process.

use kernel_memory_addresses::VirtualAddress;
use kernel_vmem::{PageTable, Vma};

/// The kind of access that trapped.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Access {
    Read,
    Write,
    Execute,
}

impl Access {
    /// Decode a RISC-V `scause` value; `None` for anything but a page fault.
    #[must_use]
    pub const fn from_scause(scause: u64) -> Option<Self> {
        match scause {
            12 => Some(Self::Execute),
            13 => Some(Self::Read),
            15 => Some(Self::Write),
            _ => None,
        }
    }
}

/// Reading from a region's backing file failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("backing store read at offset {offset} failed")]
pub struct BackingStoreError {
    pub offset: u64,
}

/// A user process as seen by the fault path.
pub trait UserProcess {
    type Table: PageTable;

    /// Handle to a region's backing file; cloning must be cheap.
    type File: Clone;

    fn pid(&self) -> u32;

    /// Size of the process image. Addresses below it belong to the image.
    fn size(&self) -> u64;

    /// The file-backed region containing `va`, if any.
    fn lookup_region(&self, va: VirtualAddress) -> Option<Vma<Self::File>>;

    /// Read from `file` at `offset` into `dst`; returns the number of bytes read.
    ///
    /// # Errors
    /// The backing store could not be read.
    fn read_file(
        &self,
        file: &Self::File,
        offset: u64,
        dst: &mut [u8],
    ) -> Result<usize, BackingStoreError>;

    fn page_table(&self) -> &Self::Table;

    fn page_table_mut(&mut self) -> &mut Self::Table;
}
