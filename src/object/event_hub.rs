// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Completion Hubs
//!
//! An event hub collects the completions of asynchronous operations and lets
//! threads block until one is available.
//!
//! # Design
//!
//! - **FIFO**: events are handed out in completion order
//! - **Single integration point**: every subsystem completes an operation
//!   with exactly one `enqueue`, which also wakes one blocked waiter
//! - **Drain under one lock**: `drain` removes up to N events atomically, so
//!   two threads racing on one hub never see the same event
//! - **Timeout is not an error**: a bounded wait simply returns and the
//!   caller re-checks `has_event`
//!
//! # Usage
//!
//! ```ignore
//! let hub = EventHub::new();
//! hub.block_until_event(&thread, Deadline::At(now + 100), &clock, &scheduler);
//! for event in hub.drain(8) {
//!     dispatch(event);
//! }
//! ```

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::object::AsyncEvent;
use crate::sched::{Deadline, Scheduler, Thread, ThreadState};
use crate::sync::{IrqSafeMutex, WaitQueue};
use crate::traits::Clock;

/// Hub identifier
pub type HubId = u64;

/// Allocate a new hub ID
fn alloc_hub_id() -> HubId {
    static NEXT_HUB_ID: AtomicU64 = AtomicU64::new(1);

    NEXT_HUB_ID.fetch_add(1, Ordering::Relaxed)
}

/// Queue and waiters
struct HubInner {
    /// Completed operations, oldest first
    queue: VecDeque<AsyncEvent>,
    /// Threads blocked in `block_until_event`
    waiters: WaitQueue,
}

/// Completion hub
pub struct EventHub {
    id: HubId,
    inner: IrqSafeMutex<HubInner>,
}

impl EventHub {
    /// Create a new, empty hub
    pub fn new() -> Arc<Self> {
        let hub = Arc::new(Self {
            id: alloc_hub_id(),
            inner: IrqSafeMutex::new(HubInner {
                queue: VecDeque::new(),
                waiters: WaitQueue::new(),
            }),
        });
        log::debug!("hub {}: created", hub.id);
        hub
    }

    /// Get the hub ID
    pub fn id(&self) -> HubId {
        self.id
    }

    /// Append a completed operation and wake one waiter
    pub fn enqueue(&self, event: AsyncEvent) {
        log::trace!(
            "hub {}: enqueue {:?} (async {})",
            self.id,
            event.kind,
            event.async_id
        );
        let woken = {
            let mut inner = self.inner.lock();
            inner.queue.push_back(event);
            inner.waiters.wake_one()
        };
        if let Some(thread) = woken {
            thread.wake();
        }
    }

    /// Check whether an event is ready
    pub fn has_event(&self) -> bool {
        !self.inner.lock().queue.is_empty()
    }

    /// Get the number of ready events
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Remove the oldest event
    pub fn dequeue_event(&self) -> Option<AsyncEvent> {
        self.inner.lock().queue.pop_front()
    }

    /// Remove up to `max` events in one step
    pub fn drain(&self, max: usize) -> Vec<AsyncEvent> {
        let mut inner = self.inner.lock();
        let count = max.min(inner.queue.len());
        inner.queue.drain(..count).collect()
    }

    /// Block `thread` until an event is ready or `deadline` passes
    ///
    /// `thread` must be the scheduler's current thread. Returns without
    /// suspending when an event is already queued or the deadline already
    /// passed. The hub lock is dropped before the thread is switched out.
    pub fn block_until_event(
        &self,
        thread: &Arc<Thread>,
        deadline: Deadline,
        clock: &dyn Clock,
        scheduler: &Scheduler,
    ) {
        loop {
            {
                let mut inner = self.inner.lock();
                if !inner.queue.is_empty() || deadline.is_expired(clock.now()) {
                    inner.waiters.remove(thread.id());
                    break;
                }
                inner.waiters.block(thread.clone());
                thread.set_state(ThreadState::Blocked);
            }
            scheduler.block_current();
        }

        if thread.state() == ThreadState::Blocked {
            thread.set_state(ThreadState::Running);
        }
    }

    /// Get the number of blocked waiters
    pub fn waiter_count(&self) -> usize {
        self.inner.lock().waiters.len()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub").field("id", &self.id).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
