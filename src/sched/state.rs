// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread state and flags

use bitflags::bitflags;

/// Thread states
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Thread is in the ready queue
    Ready = 0,
    /// Thread is the current execution context
    Running = 1,
    /// Thread waits on a hub and is in no queue
    Blocked = 2,
    /// Thread was killed
    Terminated = 3,
}

impl ThreadState {
    /// Create from raw value
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Ready,
            1 => Self::Running,
            2 => Self::Blocked,
            _ => Self::Terminated,
        }
    }

    /// Get raw value
    pub const fn into_raw(self) -> u8 {
        self as u8
    }
}

bitflags! {
    /// Thread flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ThreadFlags: u32 {
        /// Thread owns its execution context exclusively
        const EXCLUSIVE = 0x01;
        /// A trap kills the thread instead of suspending it
        const TRAPS_ARE_FATAL = 0x02;
        /// Thread is not put back on the ready queue when it yields
        const NOT_SCHEDULED = 0x04;
    }
}

impl ThreadFlags {
    /// Flags user code may pass to create-thread
    pub const USER_CREATE: Self = Self::EXCLUSIVE.union(Self::TRAPS_ARE_FATAL);
}
