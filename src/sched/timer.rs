// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Deadline Timers
//!
//! Wakes threads whose bounded hub wait ran out.
//!
//! # Design
//!
//! - **Weak thread references**: a timer never keeps a thread alive
//! - **Sorted queue**: timers are kept ordered by deadline, ties in install order
//! - **Tick driven**: the timer interrupt calls [`TimerQueue::fire_expired`]
//!   and resumes whatever it returns
//!
//! # Usage
//!
//! ```ignore
//! timers.install(Timer::new(deadline, &thread));
//! for thread in timers.fire_expired(clock.now()) {
//!     scheduler.resume(&thread);
//! }
//! ```

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

use super::thread::Thread;
use crate::sync::IrqSafeMutex;

/// ============================================================================
/// Deadline
/// ============================================================================

/// Absolute deadline for a blocking wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Wait until an event arrives
    Never,

    /// Give up at this clock tick
    At(u64),
}

impl Deadline {
    /// A deadline that has always passed; waiting with it only polls
    pub const fn poll() -> Self {
        Self::At(0)
    }

    /// Check whether the deadline has passed at `now`
    pub const fn is_expired(self, now: u64) -> bool {
        match self {
            Self::Never => false,
            Self::At(tick) => now >= tick,
        }
    }
}

/// ============================================================================
/// Timer
/// ============================================================================

/// A thread to resume at a deadline
#[derive(Debug, Clone)]
pub struct Timer {
    /// Tick at which the timer fires
    pub deadline: u64,

    /// Thread to resume
    pub thread: Weak<Thread>,
}

impl Timer {
    /// Create a new timer for `thread`
    pub fn new(deadline: u64, thread: &Arc<Thread>) -> Self {
        Self {
            deadline,
            thread: Arc::downgrade(thread),
        }
    }
}

/// ============================================================================
/// Timer Queue
/// ============================================================================

/// Pending timers ordered by deadline
#[derive(Default)]
pub struct TimerQueue {
    timers: IrqSafeMutex<Vec<Timer>>,
}

impl TimerQueue {
    /// Create an empty timer queue
    pub const fn new() -> Self {
        Self {
            timers: IrqSafeMutex::new(Vec::new()),
        }
    }

    /// Install a timer
    pub fn install(&self, timer: Timer) {
        let mut timers = self.timers.lock();
        let index = timers.partition_point(|t| t.deadline <= timer.deadline);
        log::trace!("timer: install at {}", timer.deadline);
        timers.insert(index, timer);
    }

    /// Remove every timer due at `now` and return the threads still alive
    pub fn fire_expired(&self, now: u64) -> Vec<Arc<Thread>> {
        let expired: Vec<Timer> = {
            let mut timers = self.timers.lock();
            let due = timers.partition_point(|t| t.deadline <= now);
            timers.drain(..due).collect()
        };
        expired.into_iter().filter_map(|t| t.thread.upgrade()).collect()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.lock().first().map(|t| t.deadline)
    }

    /// Get the number of pending timers
    pub fn len(&self) -> usize {
        self.timers.lock().len()
    }

    /// Check if no timer is pending
    pub fn is_empty(&self) -> bool {
        self.timers.lock().is_empty()
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
    fn test_deadline_expiry() {
        assert!(!Deadline::Never.is_expired(u64::MAX));
        assert!(Deadline::poll().is_expired(0));
        assert!(Deadline::At(10).is_expired(10));
        assert!(!Deadline::At(10).is_expired(9));
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let harness = Harness::new();
        let a = harness.spawn_thread();
        let b = harness.spawn_thread();
        let c = harness.spawn_thread();

        let queue = TimerQueue::new();
        queue.install(Timer::new(30, &c));
        queue.install(Timer::new(10, &a));
        queue.install(Timer::new(20, &b));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.next_deadline(), Some(10));

        let fired = queue.fire_expired(20);
        let ids: Vec<_> = fired.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![a.id(), b.id()]);
        assert_eq!(queue.len(), 1);

        assert!(queue.fire_expired(29).is_empty());
        assert_eq!(queue.fire_expired(30).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_timer_skips_dead_threads() {
        let harness = Harness::new();
        let queue = TimerQueue::new();
        {
            let short_lived = harness.spawn_thread();
            queue.install(Timer::new(5, &short_lived));
        }
        assert!(queue.fire_expired(5).is_empty());
        assert!(queue.is_empty());
    }
}
