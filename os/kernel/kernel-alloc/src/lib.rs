//! # Physical Frame Management
//!
//! Ownership tracking and allocation of 4 KiB physical frames for a
//! multiprocessor kernel.
//!
//! ## Components
//!
//! | Item | Role |
//! |------|------|
//! | [`FrameAllocator`] | Per-processor free pools with work stealing. |
//! | [`ShareCountTable`] | How many owners each frame has; a frame is recycled at zero. |
//! | [`FrameMemory`] | Turns a frame number into bytes the kernel can touch. |
//! | [`FrameAllocConfig`] | The managed physical range and processor count. |
//! | [`CurrentCpu`] | Which processor the caller runs on. |
//! | [`invariant::halt`] | Fatal channel for corrupted bookkeeping. |
//!
//! ## Error model
//!
//! Running out of frames ([`Exhausted`]) and bad boot configuration
//! ([`ConfigError`]) are ordinary results. Releasing a frame that has no
//! owners, touching a frame outside the managed range, or freeing a
//! misaligned address means the kernel's bookkeeping is corrupt; those
//! [halt](invariant::halt).
//!
//! ## Typical usage
//!
//! ```rust
//! use kernel_alloc::*;
//! use kernel_info::boot::BootMemory;
//! use kernel_info::memory::KERNEL_BASE;
//!
//! let boot = BootMemory::new(KERNEL_BASE, KERNEL_BASE + 16 * 4096, 2);
//! let config = FrameAllocConfig::from_boot(&boot);
//! let memory = ArenaFrameMemory::for_config(&config).unwrap();
//! let frames = FrameAllocator::new(config, memory, FixedCpu::new(CpuId::BOOT)).unwrap();
//!
//! // Another processor starts empty and steals from the boot pool.
//! let frame = frames.allocate_on(CpuId::new(1)).unwrap();
//! assert_eq!(frames.pool_len(CpuId::BOOT), 15);
//!
//! // A second owner keeps the frame alive past the first free.
//! assert_eq!(frames.increment_share(frame), 2);
//! assert_eq!(frames.free(frame), FreeOutcome::StillShared(1));
//! assert_eq!(frames.free_on(CpuId::new(1), frame), FreeOutcome::Recycled);
//! assert_eq!(frames.pool_len(CpuId::new(1)), 1);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod config;
mod cpu;
mod frame_alloc;
pub mod frame_memory;
mod free_list;
pub mod invariant;
mod share_count;

pub use config::{ConfigError, FrameAllocConfig, FrameRange};
#[cfg(all(target_arch = "riscv64", target_os = "none"))]
pub use cpu::HartId;
pub use cpu::{CpuId, CurrentCpu, FixedCpu};
pub use frame_alloc::{Exhausted, FrameAllocator, FreeOutcome};
pub use frame_memory::{ArenaFrameMemory, FrameBytes, FrameMemory, HhdmFrameMemory};
pub use share_count::ShareCountTable;
