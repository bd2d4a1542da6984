use crate::process::BackingStoreError;
use kernel_alloc::Exhausted;
use kernel_memory_addresses::VirtualAddress;
use kernel_vmem::MapError;

/// Why a fault could not be resolved. Every variant means the faulting
/// process must be terminated; none of them is fatal to the kernel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FaultError {
    #[error("out of physical memory")]
    OutOfMemory,
    #[error("invalid access: {0}")]
    Invalid(#[from] InvalidAccess),
    #[error(transparent)]
    BackingStore(#[from] BackingStoreError),
    #[error("short read from backing store: expected {expected} bytes, got {read}")]
    ShortRead { expected: usize, read: usize },
    #[error("file offset for page {0} overflows")]
    FileOffsetOverflow(VirtualAddress),
    #[error("mapping failed: {0}")]
    Map(#[from] MapError),
}

impl From<Exhausted> for FaultError {
    fn from(_: Exhausted) -> Self {
        Self::OutOfMemory
    }
}

/// Why classification rejected a fault.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, thiserror::Error)]
pub enum InvalidAccess {
    #[error("address beyond the user address space")]
    BeyondUserSpace,
    #[error("address beyond the process image")]
    BeyondImage,
    #[error("page not mapped")]
    NotMapped,
    #[error("page not accessible from user mode")]
    SupervisorOnly,
    #[error("access to a present page is not permitted")]
    Protection,
    #[error("write to a read-only page")]
    ReadOnly,
    #[error("copy-on-write entry without a frame")]
    NullFrame,
}
