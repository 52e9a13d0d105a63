// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! IRQ relays and lines
//!
//! # Design
//!
//! - **Weak lines**: a relay never keeps a line alive; dead lines are pruned
//!   on the next delivery
//! - **Fan-out**: one delivery completes every wait queued on every live
//!   line of the relay
//! - **Acknowledge mode**: in automatic mode EOI is sent as part of delivery.
//!   In manual mode the relay masks itself after a delivery and stays masked
//!   until a line holder acknowledges. An interrupt raised while masked is
//!   latched and delivered on acknowledge
//! - **Dropped interrupts**: an interrupt that finds no queued wait is sent
//!   EOI and dropped
//!
//! # Usage
//!
//! ```ignore
//! let line = relays.access_line(1)?;
//! relays.setup(1, IrqFlags::MANUAL_ACKNOWLEDGE)?;
//! line.submit_wait(AsyncIrq::new(data));
//! relays.fire(1)?;          // from the interrupt handler
//! relays.acknowledge(1)?;   // after the driver serviced the device
//! ```

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;

use super::IrqFlags;
use crate::error::{HelError, HelResult};
use crate::object::AsyncIrq;
use crate::sync::IrqSafeMutex;
use crate::traits::InterruptController;

/// ============================================================================
/// IRQ Line
/// ============================================================================

/// One consumer's view of an interrupt number
pub struct IrqLine {
    number: u32,
    waits: IrqSafeMutex<VecDeque<AsyncIrq>>,
}

impl IrqLine {
    fn new(number: u32) -> Arc<Self> {
        Arc::new(Self {
            number,
            waits: IrqSafeMutex::new(VecDeque::new()),
        })
    }

    /// Get the interrupt number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Queue a wait for the next delivery
    pub fn submit_wait(&self, wait: AsyncIrq) {
        self.waits.lock().push_back(wait);
    }

    /// Get the number of queued waits
    pub fn pending_waits(&self) -> usize {
        self.waits.lock().len()
    }
}

impl fmt::Debug for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqLine")
            .field("number", &self.number)
            .field("waits", &self.pending_waits())
            .finish()
    }
}

/// ============================================================================
/// IRQ Relay
/// ============================================================================

/// Per-number delivery state
#[derive(Default)]
struct RelayState {
    lines: Vec<Weak<IrqLine>>,
    flags: IrqFlags,
    /// Masked after a manual-mode delivery
    masked: bool,
    /// Interrupt raised while masked
    pending: bool,
    /// Number of deliveries so far
    sequence: u64,
}

impl RelayState {
    /// Take every wait from every live line, pruning dead lines
    fn collect_waits(&mut self) -> Vec<AsyncIrq> {
        let mut waits = Vec::new();
        self.lines.retain(|line| match line.upgrade() {
            Some(line) => {
                waits.extend(line.waits.lock().drain(..));
                true
            }
            None => false,
        });
        waits
    }

    fn is_manual(&self) -> bool {
        self.flags.contains(IrqFlags::MANUAL_ACKNOWLEDGE)
    }
}

/// Controller calls to make once the relay lock is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Eoi,
    MaskAndEoi,
    Unmask,
    Nothing,
}

/// Interrupt fan-out for one interrupt number
pub struct IrqRelay {
    number: u32,
    state: IrqSafeMutex<RelayState>,
}

impl IrqRelay {
    fn new(number: u32) -> Self {
        Self {
            number,
            state: IrqSafeMutex::new(RelayState::default()),
        }
    }

    /// Get the interrupt number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Get the setup flags
    pub fn flags(&self) -> IrqFlags {
        self.state.lock().flags
    }

    /// Check whether the relay is masked awaiting acknowledgement
    pub fn is_masked(&self) -> bool {
        self.state.lock().masked
    }

    /// Get the number of deliveries so far
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Get the number of live lines
    pub fn line_count(&self) -> usize {
        self.state
            .lock()
            .lines
            .iter()
            .filter(|line| line.strong_count() > 0)
            .count()
    }

    /// Deliver one interrupt under the relay lock
    ///
    /// Returns the waits to complete, their sequence number and the
    /// controller action.
    fn deliver(state: &mut RelayState) -> (Vec<AsyncIrq>, u64, Action) {
        let waits = state.collect_waits();
        if waits.is_empty() {
            return (waits, state.sequence, Action::Eoi);
        }
        state.sequence += 1;
        if state.is_manual() {
            state.masked = true;
            (waits, state.sequence, Action::MaskAndEoi)
        } else {
            (waits, state.sequence, Action::Eoi)
        }
    }
}

impl fmt::Debug for IrqRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("IrqRelay")
            .field("number", &self.number)
            .field("flags", &state.flags)
            .field("masked", &state.masked)
            .field("sequence", &state.sequence)
            .finish()
    }
}

/// ============================================================================
/// Relay Table
/// ============================================================================

/// All relays plus the controller they drive
pub struct IrqRelays {
    relays: Vec<IrqRelay>,
    controller: IrqSafeMutex<Box<dyn InterruptController + Send>>,
}

impl IrqRelays {
    /// Create `count` relays driving `controller`
    pub fn new(count: usize, controller: Box<dyn InterruptController + Send>) -> Self {
        let relays = (0..count)
            .map(|number| IrqRelay::new(number as u32))
            .collect();
        Self {
            relays,
            controller: IrqSafeMutex::new(controller),
        }
    }

    /// Initialize the interrupt controller
    pub fn init(&self) -> Result<(), &'static str> {
        self.controller.lock().init()
    }

    /// Get the number of relays
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Check if there are no relays
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Get the relay for `number`
    pub fn relay(&self, number: u32) -> HelResult<&IrqRelay> {
        self.relays
            .get(number as usize)
            .ok_or(HelError::IllegalArgs)
    }

    /// Open a new line on the relay for `number`
    pub fn access_line(&self, number: u32) -> HelResult<Arc<IrqLine>> {
        let relay = self.relay(number)?;
        let line = IrqLine::new(number);
        relay.state.lock().lines.push(Arc::downgrade(&line));
        log::debug!("irq {}: line opened", number);
        Ok(line)
    }

    /// Configure the acknowledge mode of a relay
    pub fn setup(&self, number: u32, flags: IrqFlags) -> HelResult<()> {
        let relay = self.relay(number)?;
        relay.state.lock().flags = flags;
        log::debug!("irq {}: setup {:?}", number, flags);
        Ok(())
    }

    /// Hardware interrupt entry point
    pub fn fire(&self, number: u32) -> HelResult<()> {
        let relay = self.relay(number)?;
        let (waits, sequence, action) = {
            let mut state = relay.state.lock();
            if state.masked {
                log::trace!("irq {}: latched while masked", number);
                state.pending = true;
                (Vec::new(), state.sequence, Action::Eoi)
            } else {
                IrqRelay::deliver(&mut state)
            }
        };
        self.finish(number, waits, sequence, action);
        Ok(())
    }

    /// Acknowledge a manual-mode delivery
    ///
    /// Unmasks the relay, or re-delivers a latched interrupt and stays masked.
    pub fn acknowledge(&self, number: u32) -> HelResult<()> {
        let relay = self.relay(number)?;
        let (waits, sequence, action) = {
            let mut state = relay.state.lock();
            if !state.masked {
                log::warn!("irq {}: acknowledge while not masked", number);
                return Ok(());
            }
            if state.pending {
                state.pending = false;
                let (waits, sequence, _) = IrqRelay::deliver(&mut state);
                if state.is_manual() && !waits.is_empty() {
                    // Still masked from the redelivery
                    (waits, sequence, Action::Nothing)
                } else {
                    state.masked = false;
                    (waits, sequence, Action::Unmask)
                }
            } else {
                state.masked = false;
                (Vec::new(), state.sequence, Action::Unmask)
            }
        };
        self.finish(number, waits, sequence, action);
        Ok(())
    }

    /// Drive the controller and complete waits; no relay lock held
    fn finish(&self, number: u32, waits: Vec<AsyncIrq>, sequence: u64, action: Action) {
        match action {
            Action::Eoi => self.controller.lock().send_eoi(number),
            Action::MaskAndEoi => {
                let mut controller = self.controller.lock();
                controller.disable_irq(number);
                controller.send_eoi(number);
            }
            Action::Unmask => self.controller.lock().enable_irq(number),
            Action::Nothing => {}
        }

        if waits.is_empty() {
            if action != Action::Unmask {
                log::trace!("irq {}: no waiters, dropped", number);
            }
            return;
        }
        log::trace!(
            "irq {}: delivery {} to {} waits",
            number,
            sequence,
            waits.len()
        );
        for wait in waits {
            wait.complete(sequence);
        }
    }
}

impl fmt::Debug for IrqRelays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqRelays")
            .field("count", &self.relays.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
