// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Testing infrastructure
//!
//! Host-side doubles for the hardware seams and a [`Harness`] that wires
//! them into a [`Kernel`] with one running thread.
//!
//! The recording executor never switches stacks: "running" a thread only
//! changes the scheduler's bookkeeping. Its idle hook advances the manual
//! clock by one tick, so a thread waiting with a finite deadline always
//! gets there.
//!
//! # Usage
//! ```ignore
//! use crate::testing::Harness;
//!
//! let harness = Harness::new();
//! let hel = harness.hel();
//! let hub = hel.create_event_hub();
//! harness.kernel.on_irq(1)?;
//! assert_eq!(harness.controller_log.calls(), vec![ControllerCall::Eoi(1)]);
//! ```

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::config::KernelConfig;
use crate::kernel::Kernel;
use crate::object::{AddressSpace, AsyncData, EventHub, RdFolder, SubmitInfo, Universe};
use crate::sched::{Thread, ThreadContext, ThreadFlags, ThreadId};
use crate::sync::SpinMutex;
use crate::syscall::Hel;
use crate::traits::{Clock, Executor, InterruptController};

/// ============================================================================
/// Clock
/// ============================================================================

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn now(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn set(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::SeqCst);
    }

    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        ManualClock::now(self)
    }
}

/// ============================================================================
/// Executor
/// ============================================================================

/// Executor that records every switch instead of performing it
pub struct RecordingExecutor {
    switches: SpinMutex<Vec<ThreadId>>,
    restores: AtomicUsize,
    idles: AtomicUsize,
    clock: Arc<ManualClock>,
}

impl RecordingExecutor {
    pub fn new(clock: Arc<ManualClock>) -> Arc<Self> {
        Arc::new(Self {
            switches: SpinMutex::new(Vec::new()),
            restores: AtomicUsize::new(0),
            idles: AtomicUsize::new(0),
            clock,
        })
    }

    /// Threads switched to, in order
    pub fn switches(&self) -> Vec<ThreadId> {
        self.switches.lock().clone()
    }

    pub fn restore_count(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    pub fn idle_count(&self) -> usize {
        self.idles.load(Ordering::SeqCst)
    }
}

impl Executor for RecordingExecutor {
    fn switch_executor(&self, thread: &Arc<Thread>) {
        self.switches.lock().push(thread.id());
    }

    fn restore_executor(&self) {
        self.restores.fetch_add(1, Ordering::SeqCst);
    }

    fn idle(&self) {
        self.idles.fetch_add(1, Ordering::SeqCst);
        self.clock.advance(1);
    }
}

/// ============================================================================
/// Interrupt Controller
/// ============================================================================

/// One call made on the mock controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCall {
    Init,
    Enable(u32),
    Disable(u32),
    Eoi(u32),
}

/// Shared view of the calls made on a [`MockInterruptController`]
#[derive(Debug, Clone, Default)]
pub struct ControllerLog(Arc<SpinMutex<Vec<ControllerCall>>>);

impl ControllerLog {
    fn push(&self, call: ControllerCall) {
        self.0.lock().push(call);
    }

    /// Every call so far, in order
    pub fn calls(&self) -> Vec<ControllerCall> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Interrupt controller that records calls
#[derive(Debug, Default)]
pub struct MockInterruptController {
    log: ControllerLog,
}

impl MockInterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the call log that outlives the boxed controller
    pub fn log(&self) -> ControllerLog {
        self.log.clone()
    }
}

impl InterruptController for MockInterruptController {
    fn enable_irq(&mut self, irq: u32) {
        self.log.push(ControllerCall::Enable(irq));
    }

    fn disable_irq(&mut self, irq: u32) {
        self.log.push(ControllerCall::Disable(irq));
    }

    fn send_eoi(&self, irq: u32) {
        self.log.push(ControllerCall::Eoi(irq));
    }

    fn init(&mut self) -> Result<(), &'static str> {
        self.log.push(ControllerCall::Init);
        Ok(())
    }
}

/// ============================================================================
/// Harness
/// ============================================================================

/// A kernel with mock hardware and one running thread
pub struct Harness {
    pub kernel: Kernel,
    pub clock: Arc<ManualClock>,
    pub executor: Arc<RecordingExecutor>,
    pub controller_log: ControllerLog,
    /// Capability space of `thread`
    pub universe: Arc<Universe>,
    /// The current thread
    pub thread: Arc<Thread>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> Self {
        let clock = ManualClock::new();
        let executor = RecordingExecutor::new(clock.clone());
        let controller = MockInterruptController::new();
        let controller_log = controller.log();
        let kernel = Kernel::new(config, executor.clone(), Box::new(controller), clock.clone());

        let universe = Universe::new();
        let thread = kernel.create_thread(
            universe.clone(),
            AddressSpace::new(),
            RdFolder::new(),
            ThreadContext::new(0, 0),
            ThreadFlags::empty(),
        );
        kernel.scheduler().enqueue(thread.clone());
        kernel.scheduler().schedule();

        Self {
            kernel,
            clock,
            executor,
            controller_log,
            universe,
            thread,
        }
    }

    /// The call surface as seen by the current thread
    pub fn hel(&self) -> Hel<'_> {
        Hel::new(&self.kernel, self.thread.clone())
    }

    /// Create a thread sharing the current thread's spaces
    ///
    /// The thread is not enqueued and the harness keeps no reference to it.
    pub fn spawn_thread(&self) -> Arc<Thread> {
        self.kernel.create_thread(
            self.universe.clone(),
            self.thread.space().clone(),
            self.thread.directory().clone(),
            ThreadContext::new(0, 0),
            ThreadFlags::empty(),
        )
    }

    /// Fresh completion bookkeeping reporting to `hub`
    pub fn async_data(&self, hub: &Arc<EventHub>) -> AsyncData {
        AsyncData::new(hub, self.kernel.alloc_async_id(), SubmitInfo::NONE)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
