//! # User Page Fault Handling
//!
//! Resolves the page faults a process takes on purpose: first touches of
//! file-backed regions and writes to pages shared copy-on-write after a fork.
//!
//! ```text
//!  trap ─► classify ─┬─ LazyMap ──────► allocate, zero, read file, map
//!                    ├─ CopyOnWrite ──► allocate, copy, rewrite entry, free old
//!                    ├─ AlreadyWritable
//!                    └─ Invalid ──────► kill the process
//! ```
//!
//! The [`share`] helpers set up the copy-on-write state on fork and tear
//! mappings down again. Frame ownership goes through
//! [`kernel_alloc::FrameAllocator`] throughout.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod classify;
mod error;
mod process;
mod resolve;
pub mod share;

pub use crate::classify::{FaultClass, classify};
pub use crate::error::{FaultError, InvalidAccess};
pub use crate::process::{Access, BackingStoreError, UserProcess};
pub use crate::resolve::{FaultResolver, Resolution};
pub use crate::share::{release_page, share_page};
