// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Architecture helpers
//!
//! The core needs two things from the CPU: a way to halt until the next
//! interrupt and a way to keep interrupts off while a lock shared with
//! interrupt context is held. On x86_64 with the `amd64` feature these map to
//! `sti; hlt` and `cli`/`sti`.
//!
//! Host builds have no interrupt source. Unit tests model the interrupt flag
//! per OS thread so that lock paths can be checked for masking; other host
//! builds report interrupts as off and never touch them.

#[cfg(all(feature = "amd64", target_arch = "x86_64"))]
mod cpu {
    use x86_64::instructions::interrupts;

    pub fn wait_for_interrupt() {
        interrupts::enable_and_hlt();
    }

    pub fn interrupts_enabled() -> bool {
        interrupts::are_enabled()
    }

    pub fn disable_interrupts() {
        interrupts::disable();
    }

    pub fn enable_interrupts() {
        interrupts::enable();
    }
}


#[cfg(all(not(test), not(all(feature = "amd64", target_arch = "x86_64"))))]
mod cpu {
    pub fn wait_for_interrupt() {
        core::hint::spin_loop();
    }

    pub fn interrupts_enabled() -> bool {
        false
    }

    pub fn disable_interrupts() {}

    pub fn enable_interrupts() {}
}

/// Halt until the next interrupt arrives
pub fn wait_for_interrupt() {
    cpu::wait_for_interrupt();
}

/// Check whether interrupts are enabled on this CPU
pub fn interrupts_enabled() -> bool {
    cpu::interrupts_enabled()
}

/// Disable interrupts on this CPU
///
/// Returns whether they were enabled before.
pub fn save_and_disable_interrupts() -> bool {
    let enabled = cpu::interrupts_enabled();
    if enabled {
        cpu::disable_interrupts();
    }
    enabled
}

/// Restore the state returned by [`save_and_disable_interrupts`]
pub fn restore_interrupts(enabled: bool) {
    if enabled {
        cpu::enable_interrupts();
    }
}

/// Run `f` with interrupts disabled on this CPU
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let enabled = save_and_disable_interrupts();
    let result = f();
    restore_interrupts(enabled);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_interrupts_returns_value() {
        assert_eq!(without_interrupts(|| 41 + 1), 42);
    }

    #[test]
    fn test_without_interrupts_masks_and_restores() {
        assert!(interrupts_enabled());
        without_interrupts(|| {
            assert!(!interrupts_enabled());
            without_interrupts(|| assert!(!interrupts_enabled()));
            // The inner call must not re-enable
            assert!(!interrupts_enabled());
        });
        assert!(interrupts_enabled());
    }
}
