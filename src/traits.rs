// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Hardware seams
//!
//! The IPC core never touches hardware directly. Everything it needs from the
//! machine goes through the three traits below, which the boot code implements
//! for the real platform and the test suite implements with recording doubles.

use alloc::sync::Arc;

use crate::sched::Thread;

/// Trait for interrupt controller operations
///
/// This trait provides a unified interface for different interrupt controllers:
/// - x86_64: APIC/x2APIC (Local APIC + I/O APIC)
/// - ARM64: GIC (Generic Interrupt Controller)
/// - RISC-V: PLIC (Platform-Level Interrupt Controller)
pub trait InterruptController {
    /// Unmask an interrupt
    ///
    /// # Arguments
    /// * `irq` - The IRQ number to enable
    fn enable_irq(&mut self, irq: u32);

    /// Mask an interrupt
    ///
    /// # Arguments
    /// * `irq` - The IRQ number to disable
    fn disable_irq(&mut self, irq: u32);

    /// Send end-of-interrupt signal
    ///
    /// # Arguments
    /// * `irq` - The IRQ number to send EOI for (may be unused by some controllers)
    fn send_eoi(&self, irq: u32);

    /// Initialize the interrupt controller
    ///
    /// # Returns
    /// * `Ok(())` if initialization succeeded
    /// * `Err(&'static str)` if initialization failed with an error message
    fn init(&mut self) -> Result<(), &'static str>;
}

/// Execution context switching
///
/// Only the scheduler calls into an executor, and always after it released
/// the schedule lock.
pub trait Executor: Send + Sync {
    /// Make `thread` the active execution context (address space, kernel stack)
    fn switch_executor(&self, thread: &Arc<Thread>);

    /// Resume the context selected by the last `switch_executor`
    fn restore_executor(&self);

    /// Called when the ready queue is empty
    ///
    /// Halts until the next interrupt and returns.
    fn idle(&self) {
        crate::arch::wait_for_interrupt();
    }
}

/// Monotonic time source in kernel ticks
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> u64;
}
