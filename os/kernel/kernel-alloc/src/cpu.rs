//! Processor identity.
//!
//! The allocator never asks the hardware directly which processor it runs on;
//! it asks a [`CurrentCpu`] source. The kernel plugs in the hart id, hosted
//! simulations plug in a thread-local or a fixed value.

use core::fmt;

/// Index of one processor, `0..cpus`.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CpuId(usize);

impl CpuId {
    /// The processor that runs early boot.
    pub const BOOT: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CpuId({})", self.0)
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu{}", self.0)
    }
}

/// Tells the allocator which processor the caller is running on.
///
/// Implementations must be cheap and must not take locks.
pub trait CurrentCpu {
    fn current_cpu(&self) -> CpuId;
}

/// A source that always reports the same processor.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FixedCpu(CpuId);

impl FixedCpu {
    #[must_use]
    pub const fn new(cpu: CpuId) -> Self {
        Self(cpu)
    }
}

impl CurrentCpu for FixedCpu {
    #[inline]
    fn current_cpu(&self) -> CpuId {
        self.0
    }
}

impl<F> CurrentCpu for F
where
    F: Fn() -> CpuId,
{
    #[inline]
    fn current_cpu(&self) -> CpuId {
        self()
    }
}

/// Reads the hart id the trap entry code keeps in `tp`.
///
/// Only meaningful while interrupts are disabled, otherwise the caller may
/// migrate between reading and using the value.
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
#[derive(Copy, Clone, Debug, Default)]
pub struct HartId;

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
impl CurrentCpu for HartId {
    #[inline]
    fn current_cpu(&self) -> CpuId {
        let tp: usize;
        unsafe { core::arch::asm!("mv {}, tp", out(reg) tp, options(nomem, nostack)) }
        CpuId::new(tp)
    }
}
