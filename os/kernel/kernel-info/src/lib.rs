//! # Kernel Configuration and Boot Interface
//!
//! This crate is the single source of truth for the constants and boot-time
//! records that govern physical memory management. Everything that has to
//! agree between the boot path, the frame allocator and the fault handler
//! lives here, so that a change in layout is a change in one place.
//!
//! ## Overview
//!
//! The crate is organized into two modules:
//!
//! ### Memory Layout ([`memory`])
//! Compile-time constants describing the machine:
//! * **Frame geometry**: [`PAGE_SIZE`](memory::PAGE_SIZE) and [`PAGE_SHIFT`](memory::PAGE_SHIFT)
//! * **Physical layout**: [`KERNEL_BASE`](memory::KERNEL_BASE) and [`PHYS_TOP`](memory::PHYS_TOP)
//! * **Processor limit**: [`MAX_CPUS`](memory::MAX_CPUS)
//! * **User address space**: [`MAX_VA`](memory::MAX_VA)
//! * **Debug sentinels**: [`ALLOC_FILL`](memory::ALLOC_FILL) and [`SCRUB_FILL`](memory::SCRUB_FILL)
//!
//! ### Boot Information ([`boot`])
//! The [`BootMemory`](boot::BootMemory) record the early boot path hands to the
//! frame allocator: the usable physical range and the number of processors.
//!
//! ## Physical Memory Layout
//!
//! ```text
//! Physical Memory Layout (QEMU virt):
//! KERNEL_BASE ┌─────────────────────────────────┐ 0x8000_0000
//!             │       Kernel Image              │
//!             │   (Text, Data, BSS)             │
//! kernel end  ├─────────────────────────────────┤ usable_start
//!             │    Available RAM                │
//!             │  (Managed by the frame pools)   │
//! PHYS_TOP    └─────────────────────────────────┘ usable_end
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::boot::BootMemory;
//! use kernel_info::memory::{KERNEL_BASE, PAGE_SIZE, PHYS_TOP};
//!
//! let boot = BootMemory::new(KERNEL_BASE + 0x20_0000, PHYS_TOP, 4);
//! assert_eq!(boot.usable_bytes() % PAGE_SIZE, 0);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
