// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Synchronization primitives
//!
//! Every kernel object guards its state with one [`SpinMutex`]. Guards are
//! scoped values, so a lock is released on every exit path, and no code path
//! suspends the current thread while holding one. State that the interrupt
//! path also touches uses [`IrqSafeMutex`] instead.

pub mod irq_mutex;
pub mod wait_queue;

pub use spin::{Mutex as SpinMutex, MutexGuard as SpinMutexGuard};
pub use irq_mutex::{IrqSafeMutex, IrqSafeMutexGuard};
pub use wait_queue::WaitQueue;
