mod common;

use common::*;
use kernel_fault::{Access, FaultClass, FaultError, FaultResolver, InvalidAccess, classify};
use kernel_info::memory::{MAX_VA, PAGE_SIZE};
use kernel_memory_addresses::{FrameNumber, VirtualAddress, VirtualPage};
use kernel_vmem::{PageEntryBits, Protection, Vma};

const SIZE: u64 = 0x10000;

fn process() -> TestProcess {
    TestProcess::new(7, SIZE)
}

fn invalid(process: &TestProcess, va: u64, access: Access) -> InvalidAccess {
    match classify(process, VirtualAddress::new(va), access) {
        FaultClass::Invalid(reason) => reason,
        other => panic!("expected an invalid access, got {other:?}"),
    }
}

fn entry(frame: u64) -> PageEntryBits {
    PageEntryBits::new()
        .with_valid(true)
        .with_readable(true)
        .with_user(true)
        .with_frame(FrameNumber::new(frame))
}

#[test]
fn beyond_the_user_address_space() {
    let mut p = process();
    p.regions.push(Vma::new(
        VirtualPage::containing(VirtualAddress::new(MAX_VA - PAGE_SIZE)),
        PAGE_SIZE,
        TestFile::patterned(16),
        0,
        Protection::READ,
    ));
    assert_eq!(invalid(&p, MAX_VA, Access::Write), InvalidAccess::BeyondUserSpace);
    assert_eq!(invalid(&p, u64::MAX, Access::Read), InvalidAccess::BeyondUserSpace);
}

#[test]
fn beyond_the_image() {
    assert_eq!(invalid(&process(), SIZE, Access::Write), InvalidAccess::BeyondImage);
}

#[test]
fn not_mapped() {
    assert_eq!(invalid(&process(), 0x2000, Access::Write), InvalidAccess::NotMapped);

    let mut p = process();
    p.table.set_entry(VirtualAddress::new(0x2000), PageEntryBits::new());
    assert_eq!(invalid(&p, 0x2010, Access::Read), InvalidAccess::NotMapped);
}

#[test]
fn supervisor_only() {
    let mut p = process();
    p.table
        .set_entry(VirtualAddress::new(0x2000), entry(0x80001).with_user(false));
    assert_eq!(invalid(&p, 0x2000, Access::Write), InvalidAccess::SupervisorOnly);
}

#[test]
fn read_or_execute_on_a_present_page() {
    let mut p = process();
    p.table.set_entry(VirtualAddress::new(0x2000), entry(0x80001));
    assert_eq!(invalid(&p, 0x2000, Access::Read), InvalidAccess::Protection);
    assert_eq!(invalid(&p, 0x2000, Access::Execute), InvalidAccess::Protection);
}

#[test]
fn write_to_read_only_page() {
    let mut p = process();
    p.table.set_entry(VirtualAddress::new(0x2000), entry(0x80001));
    assert_eq!(invalid(&p, 0x2000, Access::Write), InvalidAccess::ReadOnly);
}

#[test]
fn copy_on_write_without_a_frame() {
    let mut p = process();
    p.table
        .set_entry(VirtualAddress::new(0x2000), entry(0).with_copy_on_write(true));
    assert_eq!(invalid(&p, 0x2000, Access::Write), InvalidAccess::NullFrame);
}

#[test]
fn writable_pages_pass_through() {
    let mut p = process();
    p.table
        .set_entry(VirtualAddress::new(0x2000), entry(0x80001).with_writable(true));
    assert_eq!(
        classify(&p, VirtualAddress::new(0x2000), Access::Write),
        FaultClass::AlreadyWritable
    );
}

#[test]
fn copy_on_write_pages() {
    let mut p = process();
    let cow = entry(0x80001).with_copy_on_write(true);
    p.table.set_entry(VirtualAddress::new(0x2000), cow);
    assert_eq!(
        classify(&p, VirtualAddress::new(0x2FFF), Access::Write),
        FaultClass::CopyOnWrite(cow)
    );
}

#[test]
fn region_pages_are_lazy_until_mapped() {
    let mut p = process();
    let start = VirtualPage::containing(VirtualAddress::new(0x4000_0000));
    let vma = Vma::new(start, PAGE_SIZE, TestFile::patterned(16), 0, Protection::READ);
    p.regions.push(vma.clone());

    assert_eq!(
        classify(&p, start.base(), Access::Read),
        FaultClass::LazyMap(vma)
    );

    // Once mapped, the entry decides.
    let cow = entry(0x80001).with_copy_on_write(true);
    p.table.set_entry(start.base(), cow);
    assert_eq!(
        classify(&p, start.base(), Access::Write),
        FaultClass::CopyOnWrite(cow)
    );
}

#[test]
fn invalid_faults_leave_the_allocator_alone() {
    let frames = frames(4);
    let mut p = process();
    let resolver = FaultResolver::new(&frames);
    assert_eq!(
        resolver.resolve_fault(&mut p, VirtualAddress::new(0x2000), Access::Write),
        Err(FaultError::Invalid(InvalidAccess::NotMapped))
    );
    assert_eq!(frames.free_count(), 4);
}

#[test]
fn errors_describe_themselves() {
    assert_eq!(
        FaultError::Invalid(InvalidAccess::ReadOnly).to_string(),
        "invalid access: write to a read-only page"
    );
    assert_eq!(
        FaultError::ShortRead { expected: 4096, read: 3 }.to_string(),
        "short read from backing store: expected 4096 bytes, got 3"
    );
}
