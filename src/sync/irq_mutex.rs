// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Interrupt-safe spin lock
//!
//! A lock that the interrupt path also takes must be held with interrupts
//! off on the local CPU. Otherwise an interrupt arriving while a thread holds
//! it spins on the lock forever.
//!
//! [`IrqSafeMutex::lock`] saves the interrupt state and disables interrupts
//! before taking the inner [`SpinMutex`]. The guard releases the lock first
//! and then restores the saved state.
//!
//! # Usage
//!
//! ```ignore
//! let waits = IrqSafeMutex::new(VecDeque::new());
//! waits.lock().push_back(wait); // interrupts off only while the guard lives
//! ```

use core::ops::{Deref, DerefMut};

use super::{SpinMutex, SpinMutexGuard};
use crate::arch;

/// Spin lock that keeps interrupts off while held
pub struct IrqSafeMutex<T> {
    inner: SpinMutex<T>,
}

impl<T> IrqSafeMutex<T> {
    /// Create a new unlocked mutex
    pub const fn new(value: T) -> Self {
        Self {
            inner: SpinMutex::new(value),
        }
    }

    /// Disable interrupts, then acquire the lock
    pub fn lock(&self) -> IrqSafeMutexGuard<'_, T> {
        let saved = SavedInterrupts(arch::save_and_disable_interrupts());
        IrqSafeMutexGuard {
            guard: self.inner.lock(),
            _saved: saved,
        }
    }
}

impl<T: Default> Default for IrqSafeMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Puts the interrupt state back on drop
struct SavedInterrupts(bool);

impl Drop for SavedInterrupts {
    fn drop(&mut self) {
        arch::restore_interrupts(self.0);
    }
}

/// Guard returned by [`IrqSafeMutex::lock`]
pub struct IrqSafeMutexGuard<'a, T> {
    // Fields drop in order: unlock, then restore interrupts
    guard: SpinMutexGuard<'a, T>,
    _saved: SavedInterrupts,
}

impl<T> Deref for IrqSafeMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for IrqSafeMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

// ============================================================================
// Tests
// ============================================================================
