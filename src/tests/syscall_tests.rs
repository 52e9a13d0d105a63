// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! System Call Integration Tests
//!
//! Drives the register-only calls through [`syscall_dispatch`] the way the
//! architecture entry point does, checking the negative-error convention.

use crate::error::HelError;
use crate::object::{DescriptorKind, Handle, MemoryKind, PAGE_SIZE};
use crate::sched::Deadline;
use crate::syscall::{err_to_ret, number, syscall_dispatch, SyscallArgs, SyscallRet};
use crate::testing::Harness;

fn call(harness: &Harness, number: u32, args: [usize; 6]) -> SyscallRet {
    syscall_dispatch(&harness.hel(), SyscallArgs::new(number, args))
}

fn handle(ret: SyscallRet) -> Handle {
    assert!(ret > 0, "expected a handle, got {}", ret);
    Handle::from_raw(ret as u64)
}

/// Test syscall dispatch with unknown syscall number
#[test]
fn test_syscall_unknown() {
    let harness = Harness::new();
    let result = call(&harness, 0xFF, [0; 6]);
    assert_eq!(result, err_to_ret(HelError::IllegalArgs));
}

#[test]
fn test_descriptor_messaging_is_typed_only() {
    let harness = Harness::new();
    let hub = handle(call(&harness, number::CREATE_EVENT_HUB, [0; 6])).into_raw() as usize;

    // The full message header does not fit the argument registers
    for reserved in [0x31, 0x32] {
        assert_eq!(
            call(&harness, reserved, [0, hub, 0, 0, 0, 0]),
            err_to_ret(HelError::IllegalArgs)
        );
    }
}

#[test]
fn test_descriptor_calls() {
    let harness = Harness::new();

    let hub = handle(call(&harness, number::CREATE_EVENT_HUB, [0; 6]));
    let raw = hub.into_raw() as usize;
    assert_eq!(
        call(&harness, number::DESCRIPTOR_INFO, [raw, 0, 0, 0, 0, 0]),
        DescriptorKind::EventHub.into_raw() as SyscallRet
    );

    let dup = handle(call(&harness, number::DUPLICATE_DESCRIPTOR, [raw, 0, 0, 0, 0, 0]));
    assert_ne!(dup, hub);

    let this = Handle::THIS_UNIVERSE.into_raw() as usize;
    let copy = handle(call(&harness, number::TRANSFER_DESCRIPTOR, [raw, this, 0, 0, 0, 0]));
    assert_ne!(copy, hub);

    assert_eq!(call(&harness, number::CLOSE_DESCRIPTOR, [raw, 0, 0, 0, 0, 0]), 0);
    assert_eq!(
        call(&harness, number::CLOSE_DESCRIPTOR, [raw, 0, 0, 0, 0, 0]),
        err_to_ret(HelError::NoDescriptor)
    );
    assert_eq!(
        call(&harness, number::DESCRIPTOR_INFO, [raw, 0, 0, 0, 0, 0]),
        err_to_ret(HelError::NoDescriptor)
    );
}

#[test]
fn test_memory_calls() {
    let harness = Harness::new();

    assert_eq!(
        call(&harness, number::ALLOCATE_MEMORY, [PAGE_SIZE, 9, 0, 0, 0, 0]),
        err_to_ret(HelError::IllegalArgs)
    );
    let memory = handle(call(&harness, number::ALLOCATE_MEMORY, [2 * PAGE_SIZE, 2, 0, 0, 0, 0]));
    let memory_raw = memory.into_raw() as usize;
    assert_eq!(
        call(&harness, number::MEMORY_INFO, [memory_raw, 0, 0, 0, 0, 0]),
        (2 * PAGE_SIZE) as SyscallRet
    );
    let kind = harness
        .universe
        .get(memory)
        .unwrap()
        .as_memory()
        .unwrap()
        .kind();
    assert_eq!(kind, MemoryKind::Backed);

    let hub = handle(call(&harness, number::CREATE_EVENT_HUB, [0; 6])).into_raw() as usize;
    let lock = call(
        &harness,
        number::SUBMIT_LOCK_MEMORY,
        [memory_raw, hub, 0, PAGE_SIZE, 0xAA, 0xBB],
    );
    assert!(lock > 0);
    assert_eq!(
        call(&harness, number::COMPLETE_LOAD, [memory_raw, 0, PAGE_SIZE, 0, 0, 0]),
        0
    );

    let events = harness
        .hel()
        .wait_for_events(Handle::from_raw(hub as u64), 8, Deadline::poll())
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].async_id, lock as i64);
    assert_eq!(events[0].submit.function, 0xAA);
    assert_eq!(events[0].submit.object, 0xBB);

    let space = handle(call(&harness, number::CREATE_SPACE, [0; 6]));
    assert_eq!(
        harness.hel().descriptor_info(space),
        Ok(DescriptorKind::AddressSpace)
    );
}

#[test]
fn test_irq_calls() {
    let harness = Harness::new();
    let hub = handle(call(&harness, number::CREATE_EVENT_HUB, [0; 6])).into_raw() as usize;

    assert_eq!(
        call(&harness, number::ACCESS_IRQ, [100_000, 0, 0, 0, 0, 0]),
        err_to_ret(HelError::IllegalArgs)
    );
    let line = handle(call(&harness, number::ACCESS_IRQ, [3, 0, 0, 0, 0, 0])).into_raw() as usize;
    assert_eq!(call(&harness, number::SETUP_IRQ, [line, 1, 0, 0, 0, 0]), 0);
    let wait = call(&harness, number::SUBMIT_WAIT_FOR_IRQ, [line, hub, 0, 0, 0, 0]);
    assert!(wait > 0);

    harness.kernel.on_irq(3).unwrap();
    assert_eq!(call(&harness, number::ACKNOWLEDGE_IRQ, [line, 0, 0, 0, 0, 0]), 0);
    assert!(!harness.kernel.irqs().relay(3).unwrap().is_masked());

    assert_eq!(call(&harness, number::ENABLE_FULL_IO, [0; 6]), 0);
    assert!(harness.thread.io_port_enabled(0x80));
}

#[test]
fn test_thread_calls() {
    let harness = Harness::new();
    harness.clock.set(77);
    assert_eq!(call(&harness, number::GET_CLOCK, [0; 6]), 77);

    // Yielding with an empty ready queue keeps the caller running
    assert_eq!(call(&harness, number::YIELD, [0; 6]), 0);
    assert_eq!(
        harness.kernel.scheduler().current().map(|t| t.id()),
        Some(harness.thread.id())
    );

    let other = harness.spawn_thread();
    let other_raw = harness
        .universe
        .attach(crate::object::Descriptor::Thread(other.clone()))
        .into_raw() as usize;
    assert_eq!(call(&harness, number::RESUME, [other_raw, 0, 0, 0, 0, 0]), 0);
    assert!(harness.kernel.scheduler().is_queued(other.id()));
}
