//! # Per-Processor Frame Allocator
//!
//! Every processor owns a free pool, a [`FreeStack`] behind its own
//! [`SpinLock`]. Allocation pops from the caller's pool and, when that is
//! empty, steals from the other pools in round-robin order starting with the
//! next processor. Freeing pushes onto the freeing processor's pool, so frames
//! migrate towards the processors that use them.
//!
//! At most one pool lock is held at any time, and the share-count lock is
//! always released before a pool lock is taken.
//!
//! ## Frame lifecycle
//!
//! ```text
//!   in a pool, count 0 ──allocate──▶ owned, count 1 ──increment_share──▶ shared, count n
//!          ▲                              │                                      │
//!          └──────── free (count → 0) ◀───┴──────── free (count n → n-1) ◀───────┘
//! ```
//!
//! Allocated frames are filled with [`ALLOC_FILL`], released frames with
//! [`SCRUB_FILL`].

use crate::config::{ConfigError, FrameAllocConfig, FrameRange};
use crate::cpu::{CpuId, CurrentCpu};
use crate::frame_memory::FrameMemory;
use crate::free_list::{FreeLinks, FreeStack};
use crate::invariant::{InvariantViolation, halt};
use crate::share_count::ShareCountTable;
use alloc::boxed::Box;
use kernel_info::memory::{ALLOC_FILL, SCRUB_FILL};
use kernel_memory_addresses::{FrameNumber, PhysicalAddress};
use kernel_sync::SpinLock;
use log::{debug, info, trace};

/// No pool on any processor has a free frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("out of physical frames")]
pub struct Exhausted;

/// What [`FrameAllocator::free`] did with the frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[must_use]
pub enum FreeOutcome {
    /// Other owners remain; the frame stays in use.
    StillShared(u32),
    /// The last owner let go and the frame is back in a pool.
    Recycled,
}

/// Physical frame allocator with one free pool per processor.
///
/// `M` gives access to frame contents and `C` tells which processor is
/// running. Every managed frame is always in exactly one of two states: in a
/// pool with a share count of 0, or owned with a count of at least 1.
pub struct FrameAllocator<M, C> {
    range: FrameRange,
    memory: M,
    cpus: C,
    shares: ShareCountTable,
    links: FreeLinks,
    pools: Box<[SpinLock<FreeStack>]>,
}

impl<M, C> FrameAllocator<M, C>
where
    M: FrameMemory,
    C: CurrentCpu,
{
    /// Build the allocator and seed every managed frame into the pool of the
    /// processor `cpus` reports now.
    ///
    /// # Errors
    /// The configuration is invalid, `memory` does not cover every managed
    /// frame, or the current processor is not one of the configured ones.
    ///
    /// # Example
    /// ```rust
    /// # use kernel_alloc::*;
    /// # use kernel_memory_addresses::FrameNumber;
    /// let config = FrameAllocConfig::with_frames(FrameNumber::new(0x80000), 4, 2);
    /// let memory = ArenaFrameMemory::for_config(&config).unwrap();
    /// let frames = FrameAllocator::new(config, memory, FixedCpu::new(CpuId::BOOT)).unwrap();
    ///
    /// let frame = frames.allocate().unwrap();
    /// assert_eq!(frames.peek_share(frame), 1);
    /// assert_eq!(frames.free(frame), FreeOutcome::Recycled);
    /// assert_eq!(frames.free_count(), 4);
    /// ```
    pub fn new(config: FrameAllocConfig, memory: M, cpus: C) -> Result<Self, ConfigError> {
        let range = config.frames()?;
        let last = range.frame_at(range.count() - 1);
        if !memory.covers(range.first()) || !memory.covers(last) {
            return Err(ConfigError::MemoryNotCovered {
                first: range.first(),
                end: range.end(),
            });
        }

        let boot = cpus.current_cpu();
        if boot.index() >= config.cpus {
            return Err(ConfigError::BootCpuOutOfRange(boot));
        }

        let pools = (0..config.cpus)
            .map(|_| SpinLock::new("frame-pool", FreeStack::new()))
            .collect();

        let allocator = Self {
            range,
            memory,
            cpus,
            shares: ShareCountTable::new(range),
            links: FreeLinks::new(range.count()),
            pools,
        };

        // Every frame starts with one owner, then goes through the regular
        // release path so it is scrubbed and lands in the boot pool.
        for frame in range.iter() {
            allocator.shares.claim(frame);
            let _ = allocator.free_on(boot, frame);
        }

        info!(
            "frame allocator: {} frames {}..{} seeded on {boot}, {} processors",
            range.count(),
            range.first().base(),
            range.end().base(),
            config.cpus,
        );
        Ok(allocator)
    }

    /// Allocate a frame on the current processor.
    ///
    /// # Errors
    /// [`Exhausted`] if no pool has a free frame.
    pub fn allocate(&self) -> Result<FrameNumber, Exhausted> {
        self.allocate_on(self.cpus.current_cpu())
    }

    /// Allocate a frame as if running on `cpu`.
    ///
    /// The frame comes back with a share count of 1 and filled with
    /// [`ALLOC_FILL`].
    ///
    /// # Errors
    /// [`Exhausted`] if no pool has a free frame. No pool is modified then.
    pub fn allocate_on(&self, cpu: CpuId) -> Result<FrameNumber, Exhausted> {
        let local = self.pool(cpu);
        let index = match local.with_lock(|pool| pool.pop(&self.links)) {
            Some(index) => index,
            None => self.steal(cpu).ok_or_else(|| {
                debug!("{cpu}: no free frames on any processor");
                Exhausted
            })?,
        };

        let frame = self.range.frame_at(index);
        self.shares.claim(frame);

        // SAFETY: the frame just left its pool; nobody else can reach it.
        unsafe { self.memory.frame_mut(frame) }.fill(ALLOC_FILL);
        Ok(frame)
    }

    fn steal(&self, thief: CpuId) -> Option<u32> {
        let count = self.pools.len();
        (1..count)
            .map(|k| CpuId::new((thief.index() + k) % count))
            .find_map(|victim| {
                let index = self.pools[victim.index()].with_lock(|pool| pool.pop(&self.links))?;
                trace!("{thief} took frame {} from {victim}", self.range.frame_at(index));
                Some(index)
            })
    }

    /// Drop one owner of `frame` on the current processor.
    ///
    /// Halts if `frame` is not managed or has no owners.
    #[track_caller]
    pub fn free(&self, frame: FrameNumber) -> FreeOutcome {
        self.free_on(self.cpus.current_cpu(), frame)
    }

    /// Drop one owner of `frame` as if running on `cpu`.
    ///
    /// When the last owner goes, the frame is filled with [`SCRUB_FILL`] and
    /// pushed onto `cpu`'s pool.
    #[track_caller]
    pub fn free_on(&self, cpu: CpuId, frame: FrameNumber) -> FreeOutcome {
        let pool = self.pool(cpu);
        let index = self.range.index_of_managed(frame);

        let remaining = self.shares.decrement(frame);
        if remaining > 0 {
            return FreeOutcome::StillShared(remaining);
        }

        // SAFETY: the last owner is gone and the frame is not yet in a pool.
        unsafe { self.memory.frame_mut(frame) }.fill(SCRUB_FILL);
        pool.with_lock(|pool| pool.push(&self.links, index));
        trace!("{cpu}: released frame {frame}");
        FreeOutcome::Recycled
    }

    /// Remove an owner of `frame` on the current processor; returns the new
    /// count.
    ///
    /// This is [`free`](Self::free) reporting a count: at 0 the frame is
    /// scrubbed and back in a pool.
    #[must_use = "the new count tells whether other owners remain"]
    #[track_caller]
    pub fn decrement_share(&self, frame: FrameNumber) -> u32 {
        match self.free(frame) {
            FreeOutcome::StillShared(remaining) => remaining,
            FreeOutcome::Recycled => 0,
        }
    }

    /// [`free`](Self::free) by physical address.
    ///
    /// Halts if `pa` is not frame aligned or not managed.
    #[track_caller]
    pub fn free_address(&self, pa: PhysicalAddress) -> FreeOutcome {
        let Some(frame) = FrameNumber::from_aligned(pa) else {
            halt(InvariantViolation::Misaligned(pa));
        };
        self.free(frame)
    }
}

impl<M, C> FrameAllocator<M, C> {
    /// Add an owner to an allocated frame; returns the new count.
    ///
    /// Halts if `frame` is not managed or is sitting in a free pool.
    #[must_use = "the new count tells how many owners share the frame"]
    #[track_caller]
    pub fn increment_share(&self, frame: FrameNumber) -> u32 {
        self.shares.share(frame)
    }

    #[must_use]
    #[track_caller]
    pub fn peek_share(&self, frame: FrameNumber) -> u32 {
        self.shares.peek(frame)
    }

    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    #[must_use]
    pub const fn frame_range(&self) -> FrameRange {
        self.range
    }

    #[must_use]
    pub const fn total_frames(&self) -> usize {
        self.range.len()
    }

    #[must_use]
    pub fn cpu_count(&self) -> usize {
        self.pools.len()
    }

    /// Frames currently sitting in any pool.
    ///
    /// Pools are summed one lock at a time, so the result is only exact while
    /// no other processor allocates or frees.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.pools.iter().map(|pool| pool.with_lock(|pool| pool.len())).sum()
    }

    #[must_use]
    #[track_caller]
    pub fn pool_len(&self, cpu: CpuId) -> usize {
        self.pool(cpu).with_lock(|pool| pool.len())
    }

    /// Visit the frames in `cpu`'s pool, most recently freed first.
    ///
    /// The pool stays locked while `f` runs; `f` must not call back into the
    /// allocator.
    #[track_caller]
    pub fn for_each_free(&self, cpu: CpuId, mut f: impl FnMut(FrameNumber)) {
        self.pool(cpu).with_lock(|pool| {
            pool.for_each(&self.links, |index| f(self.range.frame_at(index)));
        });
    }

    #[track_caller]
    fn pool(&self, cpu: CpuId) -> &SpinLock<FreeStack> {
        self.pools.get(cpu.index()).unwrap_or_else(|| {
            halt(InvariantViolation::UnknownCpu {
                cpu,
                count: self.pools.len(),
            })
        })
    }
}

impl<M, C> core::fmt::Debug for FrameAllocator<M, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameAllocator")
            .field("range", &self.range)
            .field("cpus", &self.pools.len())
            .finish_non_exhaustive()
    }
}
