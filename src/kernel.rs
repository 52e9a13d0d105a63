// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel context
//!
//! [`Kernel`] owns the global state of the message core: the scheduler, the
//! IRQ relays, the deadline timers and the async id allocator. The boot code
//! builds exactly one; tests build as many independent ones as they like.
//!
//! # Usage
//!
//! ```ignore
//! let kernel = Kernel::new(KernelConfig::default(), executor, controller, clock);
//! kernel.irqs().init()?;
//!
//! // timer interrupt
//! kernel.on_tick();
//! // device interrupt
//! kernel.on_irq(vector - IRQ_BASE)?;
//! ```

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicI64, Ordering};

use crate::config::KernelConfig;
use crate::error::HelResult;
use crate::interrupt::IrqRelays;
use crate::object::{AddressSpace, RdFolder, Universe};
use crate::sched::{Scheduler, Thread, ThreadContext, ThreadFlags, TimerQueue};
use crate::traits::{Clock, Executor, InterruptController};

/// Global state of the message core
pub struct Kernel {
    config: KernelConfig,
    scheduler: Arc<Scheduler>,
    irqs: IrqRelays,
    timers: TimerQueue,
    clock: Arc<dyn Clock>,
    next_async_id: AtomicI64,
}

impl Kernel {
    /// Create a kernel context
    pub fn new(
        config: KernelConfig,
        executor: Arc<dyn Executor>,
        controller: Box<dyn InterruptController + Send>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        log::info!(
            "kernel: {} irq relays, {} events per wait, {} byte messages",
            config.irq_relays,
            config.max_events_per_wait,
            config.max_string_payload
        );
        Self {
            config,
            scheduler: Scheduler::new(executor),
            irqs: IrqRelays::new(config.irq_relays, controller),
            timers: TimerQueue::new(),
            clock,
            next_async_id: AtomicI64::new(1),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Get the scheduler
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// Get the IRQ relays
    pub fn irqs(&self) -> &IrqRelays {
        &self.irqs
    }

    /// Get the deadline timers
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Get the clock
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current time in ticks
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Allocate a fresh async id (never 0)
    pub fn alloc_async_id(&self) -> i64 {
        self.next_async_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Create a thread bound to this kernel's scheduler
    ///
    /// The thread is not enqueued.
    pub fn create_thread(
        &self,
        universe: Arc<Universe>,
        space: Arc<AddressSpace>,
        directory: Arc<RdFolder>,
        context: ThreadContext,
        flags: ThreadFlags,
    ) -> Arc<Thread> {
        Thread::new(
            universe,
            space,
            directory,
            context,
            flags,
            Arc::downgrade(&self.scheduler),
        )
    }

    /// Timer interrupt entry point
    ///
    /// Resumes threads whose wait deadline passed, then preempts.
    pub fn on_tick(&self) {
        let expired = self.timers.fire_expired(self.clock.now());
        for thread in &expired {
            log::trace!("kernel: deadline of thread {} passed", thread.id());
            self.scheduler.resume(thread);
        }
        self.scheduler.preempt();
    }

    /// Device interrupt entry point
    pub fn on_irq(&self, number: u32) -> HelResult<()> {
        self.irqs.fire(number)
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .field("irqs", &self.irqs)
            .field("timers", &self.timers.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
