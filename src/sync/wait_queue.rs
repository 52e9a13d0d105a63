// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Wait Queue
//!
//! A list of threads blocked until some condition of the owning object holds.
//!
//! # Design
//!
//! - **Owned by a lock**: the queue has no lock of its own; it lives inside
//!   the state guarded by the owning object's lock
//! - **Fair ordering**: FIFO, the longest waiter is woken first
//! - **Deferred wake**: `wake_one`/`wake_all` only detach threads; the caller
//!   resumes them after releasing its lock
//!
//! # Usage
//!
//! ```ignore
//! let woken = {
//!     let mut inner = object.inner.lock();
//!     inner.waiters.wake_one()
//! };
//! if let Some(thread) = woken {
//!     thread.wake();
//! }
//! ```

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::sched::{Thread, ThreadId};

/// ============================================================================
/// Wait Queue
/// ============================================================================

/// FIFO of blocked threads
#[derive(Default)]
pub struct WaitQueue {
    /// Waiting threads, oldest first
    waiters: VecDeque<Arc<Thread>>,
}

impl WaitQueue {
    /// Create a new wait queue
    pub const fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
        }
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    /// Get the number of waiters
    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Register a thread as waiting
    ///
    /// A thread that is already queued is not added a second time.
    pub fn block(&mut self, thread: Arc<Thread>) {
        if !self.contains(thread.id()) {
            self.waiters.push_back(thread);
        }
    }

    /// Detach the oldest waiter
    pub fn wake_one(&mut self) -> Option<Arc<Thread>> {
        self.waiters.pop_front()
    }

    /// Detach all waiters, oldest first
    pub fn wake_all(&mut self) -> Vec<Arc<Thread>> {
        self.waiters.drain(..).collect()
    }

    /// Remove a specific thread (e.g. after a timed-out wait)
    pub fn remove(&mut self, id: ThreadId) -> bool {
        match self.waiters.iter().position(|t| t.id() == id) {
            Some(index) => {
                self.waiters.remove(index);
                true
            }
            None => false,
        }
    }

    /// Check whether a thread is queued
    pub fn contains(&self, id: ThreadId) -> bool {
        self.waiters.iter().any(|t| t.id() == id)
    }
}

// ============================================================================
// Tests
// ============================================================================
