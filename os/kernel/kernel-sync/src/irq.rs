//! Interrupt masking for critical sections.
//!
//! [`IrqGuard`] snapshots the interrupt-enable state of the executing
//! processor, disables interrupts, and restores the snapshot on drop. Guards
//! nest naturally: an inner guard observes interrupts already disabled and
//! therefore leaves them disabled when it goes away.
//!
//! # Platform
//!
//! - `riscv64` bare metal: `sstatus.SIE` via `csrr`/`csrc`/`csrs`.
//! - `x86_64` bare metal: `RFLAGS.IF` via `pushfq`/`cli`/`sti`.
//! - Hosted builds (tests, simulations): there are no interrupts to mask and
//!   the guard is a no-op.

use core::marker::PhantomData;

/// RAII guard that disables interrupts on creation and restores them on drop.
///
/// The guard is bound to the processor that created it and is therefore
/// neither `Send` nor `Sync`.
///
/// # Examples
///
/// ```no_run
/// use kernel_sync::irq::{IrqGuard, interrupts_enabled};
///
/// {
///     let _g = IrqGuard::new(); // interrupts disabled here if previously enabled
///     assert!(!interrupts_enabled());
/// }
/// ```
pub struct IrqGuard {
    /// Whether interrupts were enabled when the guard was created.
    were_enabled: bool,
    _not_send: PhantomData<*const ()>,
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqGuard {
    /// Disables interrupts if they are currently enabled and remembers the state.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let enabled = arch::interrupts_enabled();
        if enabled {
            arch::disable_interrupts();
        }
        Self {
            were_enabled: enabled,
            _not_send: PhantomData,
        }
    }

    /// Whether this guard will re-enable interrupts when dropped.
    #[inline]
    #[must_use]
    pub const fn restores(&self) -> bool {
        self.were_enabled
    }
}

impl Drop for IrqGuard {
    /// Restores interrupts only if they were previously enabled.
    fn drop(&mut self) {
        if self.were_enabled {
            arch::enable_interrupts();
        }
    }
}

/// Whether interrupts are currently enabled on the executing processor.
#[inline]
#[must_use]
pub fn interrupts_enabled() -> bool {
    arch::interrupts_enabled()
}

#[cfg(all(target_arch = "riscv64", target_os = "none"))]
mod arch {
    /// Supervisor interrupt enable.
    const SSTATUS_SIE: u64 = 1 << 1;

    #[inline]
    pub fn interrupts_enabled() -> bool {
        let sstatus: u64;
        unsafe { core::arch::asm!("csrr {}, sstatus", out(reg) sstatus, options(nomem, nostack)) }
        sstatus & SSTATUS_SIE != 0
    }

    #[inline]
    pub fn disable_interrupts() {
        unsafe { core::arch::asm!("csrc sstatus, {}", in(reg) SSTATUS_SIE, options(nostack)) }
    }

    #[inline]
    pub fn enable_interrupts() {
        unsafe { core::arch::asm!("csrs sstatus, {}", in(reg) SSTATUS_SIE, options(nostack)) }
    }
}

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod arch {
    /// `RFLAGS.IF`
    const RFLAGS_IF: u64 = 1 << 9;

    #[inline]
    pub fn interrupts_enabled() -> bool {
        let r: u64;
        unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nomem, preserves_flags)) }
        r & RFLAGS_IF != 0
    }

    #[inline]
    pub fn disable_interrupts() {
        unsafe { core::arch::asm!("cli", options(nostack, preserves_flags)) }
    }

    #[inline]
    pub fn enable_interrupts() {
        unsafe { core::arch::asm!("sti", options(nostack, preserves_flags)) }
    }
}

#[cfg(not(any(
    all(target_arch = "riscv64", target_os = "none"),
    all(target_arch = "x86_64", target_os = "none")
)))]
mod arch {
    #[inline]
    pub const fn interrupts_enabled() -> bool {
        false
    }

    #[inline]
    pub const fn disable_interrupts() {}

    #[inline]
    pub const fn enable_interrupts() {}
}
