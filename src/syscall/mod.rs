// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! System Call Interface
//!
//! The `hel` calls are the only way user code reaches the message core.
//! [`Hel`] binds the kernel context to the calling thread and exposes every
//! call as a typed method; [`syscall_dispatch`] decodes the register-only
//! calls from raw [`SyscallArgs`].
//!
//! # Design Rules
//!
//! - **Object-based**: every operation names its objects by handle in the
//!   caller's capability space
//! - **Synchronous validation**: bad handles and malformed arguments are
//!   returned directly and never create an operation
//! - **Asynchronous completion**: a submission returns an async id; the
//!   outcome arrives later on the named hub
//! - **No lock across calls**: a descriptor is copied out of the table before
//!   the object behind it is touched
//!
//! # Error Return Convention
//!
//! ```text
//! Success: return value in r0/rax/a0 (positive or zero)
//! Failure: negated HelError code
//! ```

pub mod descriptor;
pub mod hub;
pub mod ipc;
pub mod irq;
pub mod memory;
pub mod rd;
pub mod thread;

use alloc::sync::Arc;

use crate::error::{HelError, HelResult};
use crate::interrupt::IrqFlags;
use crate::kernel::Kernel;
use crate::object::{AsyncData, Descriptor, EventHub, Handle, MemoryKind, SubmitInfo, Universe};
use crate::sched::Thread;

// Syscall return type
pub type SyscallRet = isize;

/// System call arguments
///
/// Argument registers in calling-convention order:
/// - AMD64: rdi, rsi, rdx, r10, r8, r9 → args[0-5], syscall number in rax
/// - ARM64: x0-x5 → args[0-5], syscall number in x8
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SyscallArgs {
    /// Syscall number
    pub number: u32,

    /// Arguments (up to 6)
    pub args: [usize; 6],
}

impl SyscallArgs {
    /// Create new syscall arguments
    pub const fn new(number: u32, args: [usize; 6]) -> Self {
        Self { number, args }
    }

    /// Get argument at index
    pub const fn arg(&self, index: usize) -> usize {
        if index < 6 {
            self.args[index]
        } else {
            0
        }
    }

    /// Get argument as u32
    pub const fn arg_u32(&self, index: usize) -> u32 {
        self.arg(index) as u32
    }

    /// Get argument as u64
    pub const fn arg_u64(&self, index: usize) -> u64 {
        self.arg(index) as u64
    }

    /// Get argument as i64
    pub const fn arg_i64(&self, index: usize) -> i64 {
        self.arg(index) as i64
    }

    /// Get argument as a handle
    pub const fn arg_handle(&self, index: usize) -> Handle {
        Handle::from_raw(self.arg_u64(index))
    }
}

/// Convert error code to negative return value
#[inline]
pub const fn err_to_ret(err: HelError) -> SyscallRet {
    -(err.code() as SyscallRet)
}

/// Convert success value to return value
#[inline]
pub const fn ok_to_ret(val: usize) -> SyscallRet {
    val as SyscallRet
}

fn result_to_ret(result: HelResult<usize>) -> SyscallRet {
    match result {
        Ok(val) => ok_to_ret(val),
        Err(err) => err_to_ret(err),
    }
}

/// ============================================================================
/// Syscall Numbers
/// ============================================================================

/// Syscall numbers of the register-only calls
///
/// Calls that take user buffers (strings, paths, port lists, event arrays)
/// are reached through the typed [`Hel`] methods. So are the descriptor send
/// and receive calls: endpoint, hub, request, sequence, flags and the two
/// submit words do not fit six argument registers.
///
/// Numbers 0x31 and 0x32 stay reserved for those calls.
pub mod number {
    // Descriptors (0x01-0x0F)
    pub const CREATE_UNIVERSE: u32 = 0x01;
    pub const TRANSFER_DESCRIPTOR: u32 = 0x02;
    pub const DUPLICATE_DESCRIPTOR: u32 = 0x03;
    pub const DESCRIPTOR_INFO: u32 = 0x04;
    pub const CLOSE_DESCRIPTOR: u32 = 0x05;

    // Memory (0x10-0x1F)
    pub const ALLOCATE_MEMORY: u32 = 0x10;
    pub const CREATE_SPACE: u32 = 0x11;
    pub const MEMORY_INFO: u32 = 0x12;
    pub const SUBMIT_HANDLE_LOAD: u32 = 0x13;
    pub const SUBMIT_LOCK_MEMORY: u32 = 0x14;
    pub const COMPLETE_LOAD: u32 = 0x15;

    // Threads (0x20-0x2F)
    pub const YIELD: u32 = 0x20;
    pub const SUBMIT_OBSERVE: u32 = 0x21;
    pub const RESUME: u32 = 0x22;
    pub const EXIT_THREAD: u32 = 0x23;
    pub const GET_CLOCK: u32 = 0x24;

    // Messaging (0x30-0x3F)
    pub const CREATE_EVENT_HUB: u32 = 0x30;
    pub const SUBMIT_ACCEPT: u32 = 0x33;
    pub const SUBMIT_CONNECT: u32 = 0x34;
    pub const CREATE_RING: u32 = 0x35;
    pub const SUBMIT_RING: u32 = 0x36;

    // Directories (0x40-0x4F)
    pub const CREATE_DIRECTORY: u32 = 0x40;

    // Hardware (0x50-0x5F)
    pub const ACCESS_IRQ: u32 = 0x50;
    pub const SETUP_IRQ: u32 = 0x51;
    pub const ACKNOWLEDGE_IRQ: u32 = 0x52;
    pub const SUBMIT_WAIT_FOR_IRQ: u32 = 0x53;
    pub const ENABLE_IO: u32 = 0x54;
    pub const ENABLE_FULL_IO: u32 = 0x55;

    /// Maximum syscall number
    pub const MAX_SYSCALL: u32 = 0x5F;
}

/// ============================================================================
/// Hel
/// ============================================================================

/// The system call surface as seen by one calling thread
pub struct Hel<'k> {
    kernel: &'k Kernel,
    thread: Arc<Thread>,
}

impl<'k> Hel<'k> {
    /// Bind the calls to `thread`
    pub fn new(kernel: &'k Kernel, thread: Arc<Thread>) -> Self {
        Self { kernel, thread }
    }

    /// Get the kernel context
    pub fn kernel(&self) -> &'k Kernel {
        self.kernel
    }

    /// Get the calling thread
    pub fn thread(&self) -> &Arc<Thread> {
        &self.thread
    }

    /// Get the caller's capability space
    pub fn universe(&self) -> &Arc<Universe> {
        self.thread.universe()
    }

    /// Copy a descriptor out of the caller's table
    fn descriptor(&self, handle: Handle) -> HelResult<Descriptor> {
        self.universe().get(handle)
    }

    /// Resolve the hub a submission reports to
    fn hub(&self, handle: Handle) -> HelResult<Arc<EventHub>> {
        self.universe()
            .with_descriptor(handle, |d| d.as_event_hub().cloned())
    }

    /// Allocate an async id and its completion bookkeeping
    fn async_data(&self, hub: Handle, submit: SubmitInfo) -> HelResult<(i64, AsyncData)> {
        let hub = self.hub(hub)?;
        let async_id = self.kernel.alloc_async_id();
        Ok((async_id, AsyncData::new(&hub, async_id, submit)))
    }
}

/// ============================================================================
/// Syscall Dispatcher
/// ============================================================================

/// Decode and run a register-only call
///
/// Called from the architecture-specific syscall entry point.
pub fn syscall_dispatch(hel: &Hel<'_>, args: SyscallArgs) -> SyscallRet {
    let submit = SubmitInfo::new(args.arg(4), args.arg(5));
    let handle_ret = |result: HelResult<Handle>| result_to_ret(result.map(|h| h.into_raw() as usize));
    let async_ret = |result: HelResult<i64>| result_to_ret(result.map(|id| id as usize));
    let unit_ret = |result: HelResult<()>| result_to_ret(result.map(|()| 0));

    match args.number {
        number::CREATE_UNIVERSE => handle_ret(Ok(hel.create_universe())),
        number::TRANSFER_DESCRIPTOR => {
            handle_ret(hel.transfer_descriptor(args.arg_handle(0), args.arg_handle(1)))
        }
        number::DUPLICATE_DESCRIPTOR => handle_ret(hel.duplicate_descriptor(args.arg_handle(0))),
        number::DESCRIPTOR_INFO => result_to_ret(
            hel.descriptor_info(args.arg_handle(0))
                .map(|kind| kind.into_raw() as usize),
        ),
        number::CLOSE_DESCRIPTOR => unit_ret(hel.close_descriptor(args.arg_handle(0))),

        number::ALLOCATE_MEMORY => {
            let kind = match args.arg(1) {
                0 => MemoryKind::Allocated,
                1 => MemoryKind::OnDemand,
                2 => MemoryKind::Backed,
                _ => return err_to_ret(HelError::IllegalArgs),
            };
            handle_ret(hel.allocate_memory(args.arg(0), kind))
        }
        number::CREATE_SPACE => handle_ret(Ok(hel.create_space())),
        number::MEMORY_INFO => result_to_ret(hel.memory_info(args.arg_handle(0))),
        number::SUBMIT_HANDLE_LOAD => {
            async_ret(hel.submit_handle_load(args.arg_handle(0), args.arg_handle(1), submit))
        }
        number::SUBMIT_LOCK_MEMORY => async_ret(hel.submit_lock_memory(
            args.arg_handle(0),
            args.arg_handle(1),
            args.arg(2),
            args.arg(3),
            submit,
        )),
        number::COMPLETE_LOAD => {
            unit_ret(hel.complete_load(args.arg_handle(0), args.arg(1), args.arg(2)))
        }

        number::YIELD => {
            hel.yield_thread();
            0
        }
        number::SUBMIT_OBSERVE => {
            async_ret(hel.submit_observe(args.arg_handle(0), args.arg_handle(1), submit))
        }
        number::RESUME => unit_ret(hel.resume(args.arg_handle(0))),
        number::EXIT_THREAD => {
            hel.exit_thread();
            0
        }
        number::GET_CLOCK => ok_to_ret(hel.get_clock() as usize),

        number::CREATE_EVENT_HUB => handle_ret(Ok(hel.create_event_hub())),
        number::SUBMIT_ACCEPT => {
            async_ret(hel.submit_accept(args.arg_handle(0), args.arg_handle(1), submit))
        }
        number::SUBMIT_CONNECT => {
            async_ret(hel.submit_connect(args.arg_handle(0), args.arg_handle(1), submit))
        }
        number::CREATE_RING => handle_ret(Ok(hel.create_ring())),
        number::SUBMIT_RING => async_ret(hel.submit_ring(
            args.arg_handle(0),
            args.arg_handle(1),
            args.arg(2),
            submit,
        )),

        number::CREATE_DIRECTORY => handle_ret(Ok(hel.create_directory())),

        number::ACCESS_IRQ => handle_ret(hel.access_irq(args.arg_u32(0))),
        number::SETUP_IRQ => unit_ret(hel.setup_irq(args.arg_handle(0), args.arg_u32(1))),
        number::ACKNOWLEDGE_IRQ => unit_ret(hel.acknowledge_irq(args.arg_handle(0))),
        number::SUBMIT_WAIT_FOR_IRQ => {
            async_ret(hel.submit_wait_for_irq(args.arg_handle(0), args.arg_handle(1), submit))
        }
        number::ENABLE_IO => unit_ret(hel.enable_io(args.arg_handle(0))),
        number::ENABLE_FULL_IO => {
            hel.enable_full_io();
            0
        }

        _ => {
            log::warn!("syscall: unknown number {:#x}", args.number);
            err_to_ret(HelError::IllegalArgs)
        }
    }
}

/// Validate IRQ setup flags passed from user space
pub(crate) fn irq_flags_from_user(bits: u32) -> HelResult<IrqFlags> {
    IrqFlags::from_bits(bits).ok_or(HelError::IllegalArgs)
}

// ============================================================================
// Tests
// ============================================================================
