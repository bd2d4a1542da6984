#![allow(dead_code)]

use kernel_alloc::{ArenaFrameMemory, CpuId, CurrentCpu, FixedCpu, FrameAllocConfig, FrameAllocator, FrameMemory};
use kernel_fault::{BackingStoreError, UserProcess};
use kernel_info::memory::{KERNEL_BASE, PAGE_SIZE};
use kernel_memory_addresses::{FrameNumber, VirtualAddress};
use kernel_vmem::{PageEntryBits, PageTable, Protection, SoftPageTable, Vma};
use std::sync::Arc;

pub const BASE: FrameNumber = FrameNumber::new(KERNEL_BASE / PAGE_SIZE);

pub type Frames<C = FixedCpu> = FrameAllocator<ArenaFrameMemory, C>;

pub fn frames(count: u64) -> Frames {
    frames_on(count, 1, FixedCpu::new(CpuId::BOOT))
}

pub fn frames_on<C: CurrentCpu>(count: u64, cpus: usize, source: C) -> Frames<C> {
    let config = FrameAllocConfig::with_frames(BASE, count, cpus);
    let memory = ArenaFrameMemory::for_config(&config).unwrap();
    FrameAllocator::new(config, memory, source).unwrap()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestFile {
    Bytes(Arc<[u8]>),
    Broken,
}

impl TestFile {
    /// `len` bytes where byte `i` is `i % 251`.
    pub fn patterned(len: usize) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        Self::Bytes(data.into())
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(data) => data,
            Self::Broken => &[],
        }
    }
}

pub struct TestProcess<T = SoftPageTable> {
    pub pid: u32,
    pub size: u64,
    pub regions: Vec<Vma<TestFile>>,
    pub table: T,
}

impl TestProcess {
    pub fn new(pid: u32, size: u64) -> Self {
        Self::with_table(pid, size, SoftPageTable::new())
    }
}

impl<T> TestProcess<T> {
    pub fn with_table(pid: u32, size: u64, table: T) -> Self {
        Self {
            pid,
            size,
            regions: Vec::new(),
            table,
        }
    }
}

impl<T: PageTable> UserProcess for TestProcess<T> {
    type Table = T;
    type File = TestFile;

    fn pid(&self) -> u32 {
        self.pid
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn lookup_region(&self, va: VirtualAddress) -> Option<Vma<TestFile>> {
        self.regions.iter().find(|r| r.contains(va)).cloned()
    }

    fn read_file(&self, file: &TestFile, offset: u64, dst: &mut [u8]) -> Result<usize, BackingStoreError> {
        let TestFile::Bytes(data) = file else {
            return Err(BackingStoreError { offset });
        };
        let start = usize::try_from(offset).unwrap().min(data.len());
        let n = dst.len().min(data.len() - start);
        dst[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn page_table(&self) -> &T {
        &self.table
    }

    fn page_table_mut(&mut self) -> &mut T {
        &mut self.table
    }
}

pub fn user_rw() -> PageEntryBits {
    (Protection::READ | Protection::WRITE).user_leaf_bits()
}

pub fn user_ro() -> PageEntryBits {
    Protection::READ.user_leaf_bits()
}

/// Allocate a frame, fill it with `fill` and map it at `va`.
pub fn map_anonymous<C: CurrentCpu, T: PageTable>(
    frames: &Frames<C>,
    table: &mut T,
    va: VirtualAddress,
    flags: PageEntryBits,
    fill: u8,
) -> FrameNumber {
    let frame = frames.allocate().unwrap();
    unsafe { frames.memory().frame_mut(frame) }.fill(fill);
    table.install_mapping(va, frame, flags).unwrap();
    frame
}

pub fn contents<C>(frames: &Frames<C>, frame: FrameNumber) -> &[u8] {
    unsafe { frames.memory().frame_ref(frame) }
}

pub fn write<C>(frames: &Frames<C>, frame: FrameNumber, data: &[u8]) {
    (unsafe { frames.memory().frame_mut(frame) })[..data.len()].copy_from_slice(data);
}
