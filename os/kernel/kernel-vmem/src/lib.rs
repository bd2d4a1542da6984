//! # Virtual Memory Support
//!
//! RISC-V Sv39 page table entries and the narrow page table interface the
//! fault resolver works against.
//!
//! ## What you get
//! - [`PageEntryBits`], the raw Sv39 entry including the software
//!   copy-on-write bit.
//! - The [`PageTable`] trait: look up, install, and clear leaf entries.
//! - [`Vma`] and [`Protection`] for file-backed regions.
//! - [`SoftPageTable`], a map-backed [`PageTable`] for tests and simulations.
//!
//! ## Sv39 Virtual Address → Physical Address Walk
//!
//! ```text
//! | 38‒30  | 29‒21  | 20‒12  | 11‒0   |
//! | VPN[2] | VPN[1] | VPN[0] | Offset |
//! ```
//!
//! Three levels of 512 eight-byte entries. User addresses stay below
//! [`MAX_VA`](kernel_info::memory::MAX_VA), one bit short of the full 39 bits,
//! so no address ever needs sign extension.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

extern crate alloc;

mod page_entry_bits;
mod page_table;
mod region;
mod soft_table;

pub use crate::page_entry_bits::PageEntryBits;
pub use crate::page_table::{MapError, PageTable};
pub use crate::region::{Protection, Vma};
pub use crate::soft_table::SoftPageTable;
