// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread representation and management
//!
//! A thread runs inside one capability space, one address space and one
//! directory. It is shared (`Arc`) between the ready queue, hub wait queues,
//! timers and thread descriptors; all mutable state is behind atomics or
//! short spin locks.

use alloc::collections::VecDeque;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

use super::scheduler::Scheduler;
use super::state::{ThreadFlags, ThreadState};
use crate::object::{AddressSpace, AsyncObserve, Observation, RdFolder, Universe};
use crate::sync::{IrqSafeMutex, SpinMutex};

/// Thread ID type
pub type ThreadId = u64;

/// Create a new thread ID
pub fn new_thread_id() -> ThreadId {
    static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

    NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed)
}

/// Saved user entry state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadContext {
    /// Instruction pointer
    pub ip: usize,
    /// Stack pointer
    pub sp: usize,
}

impl ThreadContext {
    /// Create a new context
    pub const fn new(ip: usize, sp: usize) -> Self {
        Self { ip, sp }
    }
}

/// Thread statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadStats {
    /// Number of times this thread has been scheduled
    pub schedule_count: u64,
    /// Number of voluntary context switches
    pub voluntary_switches: u64,
    /// Number of involuntary context switches
    pub involuntary_switches: u64,
}

/// ============================================================================
/// I/O Port Permissions
/// ============================================================================

/// Number of x86 I/O ports
pub const IO_PORT_COUNT: usize = 0x10000;

/// One bit per I/O port
pub struct IoBitmap {
    words: [u64; IO_PORT_COUNT / 64],
}

impl IoBitmap {
    /// Create a bitmap with every port disabled
    pub const fn new() -> Self {
        Self {
            words: [0; IO_PORT_COUNT / 64],
        }
    }

    /// Allow access to `port`
    pub fn enable(&mut self, port: u16) {
        let port = port as usize;
        self.words[port / 64] |= 1 << (port % 64);
    }

    /// Allow access to every port
    pub fn enable_all(&mut self) {
        self.words.iter_mut().for_each(|w| *w = u64::MAX);
    }

    /// Check whether `port` is accessible
    pub fn is_enabled(&self, port: u16) -> bool {
        let port = port as usize;
        self.words[port / 64] & (1 << (port % 64)) != 0
    }

    /// Number of accessible ports
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl Default for IoBitmap {
    fn default() -> Self {
        Self::new()
    }
}

/// ============================================================================
/// Thread
/// ============================================================================

/// Thread structure
pub struct Thread {
    /// Unique thread ID
    id: ThreadId,

    /// Thread state (`ThreadState` raw value)
    state: AtomicU8,

    /// Thread flags (`ThreadFlags` bits)
    flags: AtomicU32,

    /// Capability space the thread resolves handles in
    universe: Arc<Universe>,

    /// Address space the thread executes in
    space: Arc<AddressSpace>,

    /// Root directory for path lookups
    directory: Arc<RdFolder>,

    /// Saved entry state
    context: SpinMutex<ThreadContext>,

    /// Pending observe operations
    observers: SpinMutex<VecDeque<AsyncObserve>>,

    /// Granted I/O ports
    io_ports: SpinMutex<IoBitmap>,

    /// Scheduling statistics, updated from the preemption path
    stats: IrqSafeMutex<ThreadStats>,

    /// Scheduler that resumes this thread
    scheduler: Weak<Scheduler>,
}

impl Thread {
    /// Create a new thread
    ///
    /// The thread starts out `Blocked`; enqueueing it makes it ready.
    pub fn new(
        universe: Arc<Universe>,
        space: Arc<AddressSpace>,
        directory: Arc<RdFolder>,
        context: ThreadContext,
        flags: ThreadFlags,
        scheduler: Weak<Scheduler>,
    ) -> Arc<Self> {
        let thread = Arc::new(Self {
            id: new_thread_id(),
            state: AtomicU8::new(ThreadState::Blocked.into_raw()),
            flags: AtomicU32::new(flags.bits()),
            universe,
            space,
            directory,
            context: SpinMutex::new(context),
            observers: SpinMutex::new(VecDeque::new()),
            io_ports: SpinMutex::new(IoBitmap::new()),
            stats: IrqSafeMutex::new(ThreadStats::default()),
            scheduler,
        });
        log::debug!("thread {}: created in universe {}", thread.id, thread.universe.id());
        thread
    }

    /// Get the thread ID
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Get the capability space
    pub fn universe(&self) -> &Arc<Universe> {
        &self.universe
    }

    /// Get the address space
    pub fn space(&self) -> &Arc<AddressSpace> {
        &self.space
    }

    /// Get the root directory
    pub fn directory(&self) -> &Arc<RdFolder> {
        &self.directory
    }

    /// Get the saved entry state
    pub fn context(&self) -> ThreadContext {
        *self.context.lock()
    }

    /// Replace the saved entry state
    pub fn set_context(&self, context: ThreadContext) {
        *self.context.lock() = context;
    }

    /// Get the thread state
    pub fn state(&self) -> ThreadState {
        ThreadState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Set the thread state
    ///
    /// A terminated thread stays terminated.
    pub fn set_state(&self, state: ThreadState) {
        let _ = self.state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
            if ThreadState::from_raw(raw) == ThreadState::Terminated {
                None
            } else {
                Some(state.into_raw())
            }
        });
    }

    /// Get the thread flags
    pub fn flags(&self) -> ThreadFlags {
        ThreadFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Set flags
    pub fn insert_flags(&self, flags: ThreadFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    /// Clear flags
    pub fn remove_flags(&self, flags: ThreadFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Check if the thread is runnable
    pub fn is_runnable(&self) -> bool {
        matches!(self.state(), ThreadState::Ready | ThreadState::Running)
    }

    /// Get a snapshot of the statistics
    pub fn stats(&self) -> ThreadStats {
        *self.stats.lock()
    }

    pub(crate) fn update_stats(&self, f: impl FnOnce(&mut ThreadStats)) {
        f(&mut self.stats.lock());
    }

    /// Make the thread runnable again through its scheduler
    pub fn wake(self: &Arc<Self>) {
        match self.scheduler.upgrade() {
            Some(scheduler) => scheduler.resume(self),
            None => log::warn!("thread {}: wake without a scheduler", self.id),
        }
    }

    /// Clear the suspension left by a trap
    pub fn resume(&self) {
        self.remove_flags(ThreadFlags::NOT_SCHEDULED);
    }

    /// Queue an observer; it completes on the next trap or on exit
    ///
    /// The terminated check and the push happen under the observer lock.
    /// `signal_kill` drains under the same lock after publishing the state,
    /// so an observer is either drained or sees the thread dead.
    pub fn submit_observe(&self, observe: AsyncObserve) {
        {
            let mut observers = self.observers.lock();
            if self.state() != ThreadState::Terminated {
                observers.push_back(observe);
                return;
            }
        }
        observe.complete(Observation::Exit);
    }

    /// Report a trap to the observers
    ///
    /// The thread is killed if traps are fatal, otherwise it is suspended
    /// until someone resumes it.
    pub fn raise_trap(self: &Arc<Self>) {
        log::trace!("thread {}: trap", self.id);
        self.notify_observers(Observation::Trap);

        if self.flags().contains(ThreadFlags::TRAPS_ARE_FATAL) {
            self.signal_kill();
        } else {
            self.insert_flags(ThreadFlags::NOT_SCHEDULED);
        }
    }

    /// Terminate the thread
    pub fn signal_kill(self: &Arc<Self>) {
        let previous = self.state.swap(ThreadState::Terminated.into_raw(), Ordering::AcqRel);
        if ThreadState::from_raw(previous) == ThreadState::Terminated {
            return;
        }
        log::debug!("thread {}: killed", self.id);

        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.remove(self.id);
        }
        self.notify_observers(Observation::Exit);
    }

    fn notify_observers(&self, observation: Observation) {
        let observers: Vec<AsyncObserve> = self.observers.lock().drain(..).collect();
        for observe in observers {
            observe.complete(observation);
        }
    }

    /// Number of queued observers
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Grant one I/O port
    pub fn enable_io_port(&self, port: u16) {
        self.io_ports.lock().enable(port);
    }

    /// Grant every I/O port
    pub fn enable_full_io(&self) {
        self.io_ports.lock().enable_all();
    }

    /// Check whether an I/O port was granted
    pub fn io_port_enabled(&self, port: u16) -> bool {
        self.io_ports.lock().is_enabled(port)
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("flags", &self.flags())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
