// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Configuration
//!
//! Boot-time tunables of the IPC core. A [`KernelConfig`] is consumed once by
//! [`Kernel::new`](crate::Kernel::new); nothing reads it afterwards except
//! through the kernel that owns it.

/// Default number of IRQ relays (one per interrupt number)
pub const DEFAULT_IRQ_RELAYS: usize = 256;

/// Default cap on events returned by one wait call
pub const DEFAULT_MAX_EVENTS_PER_WAIT: usize = 64;

/// Default cap on the size of one string message
pub const DEFAULT_MAX_STRING_PAYLOAD: usize = 64 * 1024;

/// Default cap on the size of one memory object
pub const DEFAULT_MAX_MEMORY_SIZE: usize = 1 << 30;

/// Kernel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Number of interrupt numbers that get a relay
    pub irq_relays: usize,

    /// Maximum number of events drained by one wait-for-events call
    pub max_events_per_wait: usize,

    /// Maximum length of a string payload; longer sends fail with `IllegalArgs`
    ///
    /// Also the largest ring buffer that can be submitted.
    pub max_string_payload: usize,

    /// Maximum size of a memory object in bytes
    pub max_memory_size: usize,
}

impl KernelConfig {
    /// Create a configuration with the default values
    pub const fn new() -> Self {
        Self {
            irq_relays: DEFAULT_IRQ_RELAYS,
            max_events_per_wait: DEFAULT_MAX_EVENTS_PER_WAIT,
            max_string_payload: DEFAULT_MAX_STRING_PAYLOAD,
            max_memory_size: DEFAULT_MAX_MEMORY_SIZE,
        }
    }

    /// Set the number of IRQ relays
    pub const fn with_irq_relays(mut self, count: usize) -> Self {
        self.irq_relays = count;
        self
    }

    /// Set the per-wait event cap
    pub const fn with_max_events_per_wait(mut self, count: usize) -> Self {
        self.max_events_per_wait = count;
        self
    }

    /// Set the string payload cap
    pub const fn with_max_string_payload(mut self, bytes: usize) -> Self {
        self.max_string_payload = bytes;
        self
    }

    /// Set the memory object size cap
    pub const fn with_max_memory_size(mut self, bytes: usize) -> Self {
        self.max_memory_size = bytes;
        self
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}
