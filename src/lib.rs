// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! # Thorn - Capability and Message Core of a Microkernel
//!
//! Thorn provides the pieces every other kernel subsystem is built on:
//!
//! - **Capability spaces**: per-domain tables mapping handles to descriptors
//! - **Message passing**: channel pairs with request/sequence matching
//! - **Completion hubs**: queues that deliver results of asynchronous operations
//! - **IRQ relays**: fan-out of hardware interrupts to waiting operations
//! - **Scheduling**: a single cooperative FIFO ready queue
//!
//! ## Layout
//!
//! ```text
//! src/
//! ├── object/            # Kernel objects (universe, channels, hubs, ...)
//! ├── sched/             # Threads, ready queue, deadline timers
//! ├── sync/              # Locks and wait queues
//! ├── interrupt/         # IRQ relays and lines
//! ├── syscall/           # The hel system call surface
//! ├── arch/              # Halt and interrupt masking helpers
//! ├── testing/           # Host doubles for the hardware seams
//! ├── tests/             # Cross-module scenarios
//! ├── kernel.rs          # Kernel context (scheduler, relays, timers)
//! ├── dispatch.rs        # User-side completion loop
//! ├── klog.rs            # `log` backend
//! ├── traits.rs          # Hardware seams (controller, executor, clock)
//! └── lib.rs             # This file
//! ```
//!
//! ## Submitting an operation
//!
//! ```ignore
//! use thorn::{Hel, Handle, Deadline, MsgFlags, SubmitInfo};
//!
//! let hel = Hel::new(&kernel, thread);
//! let hub = hel.create_event_hub();
//! let (a, b) = hel.create_full_pipe();
//! hel.submit_recv_string(a, hub, 64, 1, 0, MsgFlags::REQUEST.bits(), SubmitInfo::NONE)?;
//! hel.submit_send_string(b, hub, b"ping", 1, 0, MsgFlags::REQUEST.bits(), SubmitInfo::NONE)?;
//! let events = hel.wait_for_events(hub, 8, Deadline::Never)?;
//! ```

#![cfg_attr(not(test), no_std)]

// Alloc crate for heap allocations
extern crate alloc;

// Status codes
pub mod error;

// Boot-time tunables
pub mod config;

// Kernel logger backend
pub mod klog;

// Hardware seams
pub mod traits;

// Architecture helpers
pub mod arch;

// Synchronization primitives
pub mod sync;

// Scheduler and thread management
pub mod sched;

// Kernel objects (capability-based security)
pub mod object;

// Generic interrupt handling
pub mod interrupt;

// Kernel context
pub mod kernel;

// System call interface
pub mod syscall;

// User-side completion dispatch
pub mod dispatch;

// Testing infrastructure
#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use error::{HelError, HelResult};
pub use config::KernelConfig;
pub use kernel::Kernel;
pub use traits::{Clock, Executor, InterruptController};

// Re-export scheduler types
pub use sched::{
    Deadline,
    Scheduler,
    Thread, ThreadFlags, ThreadId, ThreadState, ThreadStats,
    Timer, TimerQueue,
};

// Re-export kernel object types
pub use object::{
    // Capability spaces
    Descriptor, DescriptorKind, Handle, Universe, UniverseId,
    // Messaging
    Channel, ChannelSide, Endpoint, FullPipe, MsgFlags, MsgHeader, RecvFilter, Server,
    // Completion
    AsyncData, AsyncEvent, EventHub, EventKind, Observation, SubmitInfo,
    // Other objects
    AddressSpace, IoSpace, Memory, MemoryKind, RdEntry, RdFolder, RingBuffer, PAGE_SIZE,
};

// Re-export interrupt types
pub use interrupt::{IrqFlags, IrqLine, IrqRelay, IrqRelays};

// Re-export syscall surface
pub use syscall::{Hel, SyscallArgs, SyscallRet};
pub use dispatch::Dispatcher;

// Integration tests (only compiled in test mode)
#[cfg(test)]
mod tests;
