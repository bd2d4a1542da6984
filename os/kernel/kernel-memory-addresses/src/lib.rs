//! # Physical and Virtual Memory Address Types
//!
//! Strongly typed wrappers for raw addresses and 4 KiB frame/page identities.
//!
//! ## Overview
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | A byte address in physical memory. |
//! | [`FrameNumber`] | The identity of one physical frame (`address / PAGE_SIZE`). |
//! | [`VirtualAddress`] | A byte address in a user address space. |
//! | [`VirtualPage`] | The page-aligned base of one virtual page. |
//!
//! The types are zero-cost `#[repr(transparent)]` wrappers around `u64`.
//! They exist so that a frame number is never mistaken for an address, and a
//! physical address is never fed into a page-table lookup.
//!
//! Only one page size exists: frames and pages are always
//! [`PAGE_SIZE`](kernel_info::memory::PAGE_SIZE) bytes.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x8020_3042);
//! let frame = pa.frame();
//! assert_eq!(frame.as_u64(), 0x80203);
//! assert_eq!(frame.base().as_u64(), 0x8020_3000);
//! assert!(FrameNumber::from_aligned(pa).is_none());
//!
//! let va = VirtualAddress::new(0x4000_1234);
//! assert_eq!(va.page().base().as_u64(), 0x4000_1000);
//! assert_eq!(va.page_offset(), 0x234);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod frame_number;
mod physical_address;
mod virtual_address;
mod virtual_page;

pub use frame_number::FrameNumber;
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;
pub use virtual_page::VirtualPage;

pub use kernel_info::memory::{PAGE_SHIFT, PAGE_SIZE};

/// Mask selecting the in-page offset bits.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;
