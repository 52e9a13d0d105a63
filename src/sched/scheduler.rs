// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler implementation
//!
//! One FIFO ready queue and one current-thread slot under a single lock.
//!
//! Picking the next thread consumes the queue guard and hands back the chosen
//! thread, so the executor switch always happens after the schedule lock is
//! released. An empty queue idles the executor and returns to the caller,
//! which re-checks whatever it was waiting for.

use alloc::collections::VecDeque;
use alloc::sync::Arc;

use super::state::{ThreadFlags, ThreadState};
use super::thread::{Thread, ThreadId};
use crate::arch;
use crate::sync::{SpinMutex, SpinMutexGuard};
use crate::traits::Executor;

/// Ready queue and current thread
#[derive(Default)]
struct ScheduleQueue {
    /// Runnable threads in arrival order
    ready: VecDeque<Arc<Thread>>,
    /// Thread owning the execution context
    current: Option<Arc<Thread>>,
}

impl ScheduleQueue {
    /// Push a thread unless it is dead or already queued
    fn enqueue(&mut self, thread: Arc<Thread>) {
        match thread.state() {
            ThreadState::Terminated | ThreadState::Ready => return,
            ThreadState::Running | ThreadState::Blocked => {}
        }
        thread.set_state(ThreadState::Ready);
        log::trace!("sched: thread {} ready", thread.id());
        self.ready.push_back(thread);
    }
}

/// How the current thread gives up the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Switch {
    Voluntary,
    Involuntary,
}

/// Scheduler
///
/// Manages the ready queue and drives the executor.
pub struct Scheduler {
    /// Ready queue
    queue: SpinMutex<ScheduleQueue>,
    /// Context switch backend
    executor: Arc<dyn Executor>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(executor: Arc<dyn Executor>) -> Arc<Self> {
        Arc::new(Self {
            queue: SpinMutex::new(ScheduleQueue::default()),
            executor,
        })
    }

    /// Get the currently running thread
    pub fn current(&self) -> Option<Arc<Thread>> {
        arch::without_interrupts(|| self.queue.lock().current.clone())
    }

    /// Get the number of threads in the ready queue
    pub fn ready_len(&self) -> usize {
        arch::without_interrupts(|| self.queue.lock().ready.len())
    }

    /// Check whether a thread is in the ready queue
    pub fn is_queued(&self, id: ThreadId) -> bool {
        arch::without_interrupts(|| self.queue.lock().ready.iter().any(|t| t.id() == id))
    }

    /// Enqueue a thread onto the ready queue
    pub fn enqueue(&self, thread: Arc<Thread>) {
        arch::without_interrupts(|| self.queue.lock().enqueue(thread));
    }

    /// Make a thread runnable regardless of what it waited for
    pub fn resume(&self, thread: &Arc<Thread>) {
        self.enqueue(thread.clone());
    }

    /// Remove a thread from the ready queue
    pub fn remove(&self, id: ThreadId) -> bool {
        arch::without_interrupts(|| {
            let mut queue = self.queue.lock();
            let before = queue.ready.len();
            queue.ready.retain(|t| t.id() != id);
            queue.ready.len() != before
        })
    }

    /// Yield the CPU to the next ready thread
    ///
    /// The current thread goes to the back of the queue unless it is marked
    /// `NOT_SCHEDULED` or no longer running.
    pub fn yield_current(&self) {
        let next = arch::without_interrupts(|| {
            let queue = self.queue.lock();
            Self::requeue_current(queue, Switch::Voluntary)
        });
        self.switch_to(next);
    }

    /// Preemption entry point for the timer interrupt
    pub fn preempt(&self) {
        let next = arch::without_interrupts(|| {
            let queue = self.queue.lock();
            Self::requeue_current(queue, Switch::Involuntary)
        });
        self.switch_to(next);
    }

    /// Switch away from a current thread that just marked itself blocked
    pub fn block_current(&self) {
        let next = arch::without_interrupts(|| {
            let queue = self.queue.lock();
            if let Some(current) = &queue.current {
                current.update_stats(|s| s.involuntary_switches += 1);
            }
            Self::pick_next(queue)
        });
        self.switch_to(next);
    }

    /// Run the next ready thread
    pub fn schedule(&self) {
        let next = arch::without_interrupts(|| Self::pick_next(self.queue.lock()));
        self.switch_to(next);
    }

    fn requeue_current(
        mut queue: SpinMutexGuard<'_, ScheduleQueue>,
        switch: Switch,
    ) -> Option<Arc<Thread>> {
        if let Some(current) = queue.current.clone() {
            current.update_stats(|s| match switch {
                Switch::Voluntary => s.voluntary_switches += 1,
                Switch::Involuntary => s.involuntary_switches += 1,
            });
            if !current.flags().contains(ThreadFlags::NOT_SCHEDULED)
                && current.state() == ThreadState::Running
            {
                queue.enqueue(current);
            }
        }
        Self::pick_next(queue)
    }

    /// Pop the next thread and make it current; consumes the guard
    fn pick_next(mut queue: SpinMutexGuard<'_, ScheduleQueue>) -> Option<Arc<Thread>> {
        let next = queue.ready.pop_front()?;
        next.set_state(ThreadState::Running);
        next.update_stats(|s| s.schedule_count += 1);
        queue.current = Some(next.clone());
        Some(next)
    }

    fn switch_to(&self, next: Option<Arc<Thread>>) {
        match next {
            Some(thread) => {
                log::trace!("sched: switch to thread {}", thread.id());
                self.executor.switch_executor(&thread);
                self.executor.restore_executor();
            }
            None => self.executor.idle(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[test]
    fn test_fifo_yield() {
        let harness = Harness::new();
        let scheduler = harness.kernel.scheduler();
        let main = harness.thread.clone();
        let a = harness.spawn_thread();
        let b = harness.spawn_thread();

        scheduler.enqueue(a.clone());
        scheduler.enqueue(b.clone());
        assert_eq!(scheduler.ready_len(), 2);

        scheduler.yield_current();
        assert_eq!(scheduler.current().map(|t| t.id()), Some(a.id()));
        assert_eq!(main.state(), ThreadState::Ready);

        scheduler.yield_current();
        assert_eq!(scheduler.current().map(|t| t.id()), Some(b.id()));

        scheduler.yield_current();
        assert_eq!(scheduler.current().map(|t| t.id()), Some(main.id()));
        assert_eq!(
            harness.executor.switches(),
            vec![main.id(), a.id(), b.id(), main.id()]
        );
    }

    #[test]
    fn test_not_scheduled_is_not_requeued() {
        let harness = Harness::new();
        let scheduler = harness.kernel.scheduler();
        let other = harness.spawn_thread();
        scheduler.enqueue(other.clone());

        harness.thread.insert_flags(ThreadFlags::NOT_SCHEDULED);
        scheduler.yield_current();

        assert_eq!(scheduler.current().map(|t| t.id()), Some(other.id()));
        assert!(!scheduler.is_queued(harness.thread.id()));
    }

    #[test]
    fn test_empty_queue_idles_and_returns() {
        let harness = Harness::new();
        let scheduler = harness.kernel.scheduler();
        harness.thread.set_state(ThreadState::Blocked);

        let idles = harness.executor.idle_count();
        scheduler.block_current();
        assert_eq!(harness.executor.idle_count(), idles + 1);
        assert_eq!(harness.thread.stats().involuntary_switches, 1);
    }

    #[test]
    fn test_resume_does_not_duplicate() {
        let harness = Harness::new();
        let scheduler = harness.kernel.scheduler();
        let other = harness.spawn_thread();

        scheduler.resume(&other);
        scheduler.resume(&other);
        assert_eq!(scheduler.ready_len(), 1);
        assert_eq!(other.state(), ThreadState::Ready);
    }

    #[test]
    fn test_preempt_requeues_running_thread() {
        let harness = Harness::new();
        let scheduler = harness.kernel.scheduler();
        let other = harness.spawn_thread();
        scheduler.enqueue(other.clone());

        scheduler.preempt();
        assert_eq!(scheduler.current().map(|t| t.id()), Some(other.id()));
        assert!(scheduler.is_queued(harness.thread.id()));
        assert_eq!(harness.thread.stats().involuntary_switches, 1);
    }

    #[test]
    fn test_killed_thread_leaves_queue() {
        let harness = Harness::new();
        let scheduler = harness.kernel.scheduler();
        let other = harness.spawn_thread();
        scheduler.enqueue(other.clone());

        other.signal_kill();
        assert_eq!(scheduler.ready_len(), 0);
        scheduler.resume(&other);
        assert_eq!(scheduler.ready_len(), 0);
    }
}
