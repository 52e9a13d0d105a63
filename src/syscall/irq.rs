// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Interrupt and I/O port calls

use super::{irq_flags_from_user, Hel};
use crate::error::HelResult;
use crate::object::{AsyncIrq, Descriptor, Handle, IoSpace, SubmitInfo};

impl<'k> Hel<'k> {
    /// Open a line on the relay for interrupt `number`
    pub fn access_irq(&self, number: u32) -> HelResult<Handle> {
        let line = self.kernel.irqs().access_line(number)?;
        Ok(self.universe().attach(Descriptor::Irq(line)))
    }

    /// Configure the acknowledge mode of the line's relay
    pub fn setup_irq(&self, line: Handle, flags: u32) -> HelResult<()> {
        let flags = irq_flags_from_user(flags)?;
        let number = self
            .universe()
            .with_descriptor(line, |d| d.as_irq().map(|line| line.number()))?;
        self.kernel.irqs().setup(number, flags)
    }

    /// Acknowledge a manual-mode delivery
    pub fn acknowledge_irq(&self, line: Handle) -> HelResult<()> {
        let number = self
            .universe()
            .with_descriptor(line, |d| d.as_irq().map(|line| line.number()))?;
        self.kernel.irqs().acknowledge(number)
    }

    /// Wait for the next interrupt on a line
    pub fn submit_wait_for_irq(
        &self,
        line: Handle,
        hub: Handle,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        let line = self
            .universe()
            .with_descriptor(line, |d| d.as_irq().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;
        line.submit_wait(AsyncIrq::new(data));
        Ok(async_id)
    }

    /// Create a port space for `ports`
    pub fn access_io(&self, ports: &[u32]) -> HelResult<Handle> {
        let space = IoSpace::new(ports)?;
        Ok(self.universe().attach(Descriptor::Io(space)))
    }

    /// Grant the ports of a port space to the calling thread
    pub fn enable_io(&self, io: Handle) -> HelResult<()> {
        let space = self
            .universe()
            .with_descriptor(io, |d| d.as_io().cloned())?;
        space.enable_in_thread(&self.thread);
        Ok(())
    }

    /// Grant every I/O port to the calling thread
    pub fn enable_full_io(&self) {
        log::debug!("hel: full io for thread {}", self.thread.id());
        self.thread.enable_full_io();
    }
}

// ============================================================================
// Tests
// ============================================================================
