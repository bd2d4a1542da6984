//! Fatal invariant violations.
//!
//! Recoverable conditions (running out of frames, bad boot configuration) are
//! ordinary `Result` values. The checks in this module are different: they
//! fire only when a caller has corrupted the frame bookkeeping, and the kernel
//! cannot safely continue. [`halt`] logs the violation and panics; the kernel
//! panic handler stops the machine.

use crate::cpu::CpuId;
use kernel_memory_addresses::{FrameNumber, PhysicalAddress};

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    /// A frame was released more often than it was shared.
    #[error("share count underflow on frame {0}")]
    ShareCountUnderflow(FrameNumber),
    #[error("share count overflow on frame {0}")]
    ShareCountOverflow(FrameNumber),
    #[error("frame {frame} outside managed range {first}..{end}")]
    FrameOutOfRange {
        frame: FrameNumber,
        first: FrameNumber,
        end: FrameNumber,
    },
    #[error("physical address {0} is not frame aligned")]
    Misaligned(PhysicalAddress),
    #[error("{cpu} is not one of the {count} configured processors")]
    UnknownCpu { cpu: CpuId, count: usize },
    /// A frame sitting in a free pool still had owners.
    #[error("free frame {frame} still has share count {count}")]
    FreeFrameReferenced { frame: FrameNumber, count: u32 },
    /// A frame sitting in a free pool was given another owner.
    #[error("frame {0} is free and cannot gain a share")]
    ShareOfFreeFrame(FrameNumber),
}

/// Report a broken invariant and stop.
///
/// # Panics
/// Always.
#[cold]
#[track_caller]
pub fn halt(violation: InvariantViolation) -> ! {
    log::error!("memory invariant violated: {violation}");
    panic!("memory invariant violated: {violation}");
}
