//! # Kernel synchronization primitives
//!
//! Every lock in the memory core is a [`SpinLock`]: a test-and-test-and-set
//! spin lock whose guard also masks interrupts on the executing processor for
//! the lifetime of the critical section ([`IrqGuard`]). A timer interrupt can
//! therefore never re-enter a lock its own processor already holds.
//!
//! Critical sections are expected to be short and bounded; nothing here ever
//! sleeps.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod spin_lock;

pub use irq::IrqGuard;
pub use spin_lock::{SpinLock, SpinLockGuard};
