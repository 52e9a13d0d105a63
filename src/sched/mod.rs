// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler and thread management
//!
//! A single FIFO ready queue shared by every execution context. Threads run
//! until they yield, block on a hub, or are preempted by the timer tick.
//!
//! # Example
//! ```ignore
//! use thorn::sched::Scheduler;
//!
//! let scheduler = Scheduler::new(executor);
//! scheduler.enqueue(thread);
//! scheduler.schedule();
//! ```

pub mod state;
pub mod thread;
pub mod scheduler;
pub mod timer;

pub use state::{ThreadFlags, ThreadState};
pub use thread::{new_thread_id, IoBitmap, Thread, ThreadContext, ThreadId, ThreadStats};
pub use scheduler::Scheduler;
pub use timer::{Deadline, Timer, TimerQueue};
