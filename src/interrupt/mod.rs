// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Generic interrupt handling
//!
//! Hardware interrupts are turned into completions. One relay exists per
//! interrupt number; user space opens any number of lines on a relay and
//! queues irq-wait operations on them. The architecture-specific
//! [`InterruptController`](crate::traits::InterruptController) is only
//! driven from here.
//!
//! # Lock order
//!
//! Relay state first, then each line's wait queue. The controller is called
//! and operations are completed after both are released.

pub mod relay;

pub use relay::{IrqLine, IrqRelay, IrqRelays};

bitflags::bitflags! {
    /// Relay setup flags
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IrqFlags: u32 {
        /// Keep the interrupt masked after delivery until acknowledged
        const MANUAL_ACKNOWLEDGE = 0x01;
    }
}
