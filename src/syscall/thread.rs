// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread calls

use super::Hel;
use crate::error::{HelError, HelResult};
use crate::object::{AsyncObserve, Descriptor, Handle, SubmitInfo};
use crate::sched::{ThreadContext, ThreadFlags};

impl<'k> Hel<'k> {
    /// Create and enqueue a thread
    ///
    /// Null handles inherit the caller's capability space, address space or
    /// directory. `flags` may only contain `EXCLUSIVE` and `TRAPS_ARE_FATAL`.
    ///
    /// The returned handle lives in the caller's capability space and keeps
    /// the thread alive. A thread holds its own space strongly, so when both
    /// are the same space they keep each other alive until the handle is
    /// closed.
    #[allow(clippy::too_many_arguments)]
    pub fn create_thread(
        &self,
        universe: Handle,
        space: Handle,
        directory: Handle,
        ip: usize,
        sp: usize,
        flags: u32,
    ) -> HelResult<Handle> {
        let flags = ThreadFlags::from_bits(flags)
            .filter(|flags| ThreadFlags::USER_CREATE.contains(*flags))
            .ok_or(HelError::IllegalArgs)?;

        let universe = if universe.is_null() {
            self.universe().clone()
        } else {
            self.target_universe(universe)?
        };
        let space = if space.is_null() {
            self.thread.space().clone()
        } else {
            self.universe()
                .with_descriptor(space, |d| d.as_address_space().cloned())?
        };
        let directory = if directory.is_null() {
            self.thread.directory().clone()
        } else {
            self.universe()
                .with_descriptor(directory, |d| d.as_directory().cloned())?
        };

        let thread = self.kernel.create_thread(
            universe,
            space,
            directory,
            ThreadContext::new(ip, sp),
            flags,
        );
        self.kernel.scheduler().enqueue(thread.clone());
        Ok(self.universe().attach(Descriptor::Thread(thread)))
    }

    /// Give up the CPU to the next ready thread
    pub fn yield_thread(&self) {
        self.kernel.scheduler().yield_current();
    }

    /// Observe the next trap or the exit of a thread
    pub fn submit_observe(&self, thread: Handle, hub: Handle, submit: SubmitInfo) -> HelResult<i64> {
        let thread = self
            .universe()
            .with_descriptor(thread, |d| d.as_thread().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;
        thread.submit_observe(AsyncObserve::new(data));
        Ok(async_id)
    }

    /// Clear a trap suspension and make the thread runnable
    pub fn resume(&self, thread: Handle) -> HelResult<()> {
        let thread = self
            .universe()
            .with_descriptor(thread, |d| d.as_thread().cloned())?;
        thread.resume();
        self.kernel.scheduler().resume(&thread);
        Ok(())
    }

    /// Terminate the calling thread
    pub fn exit_thread(&self) {
        self.thread.signal_kill();
        self.kernel.scheduler().schedule();
    }

    /// Current kernel time
    pub fn get_clock(&self) -> u64 {
        self.kernel.now()
    }

    /// Write a message to the kernel log
    pub fn log(&self, text: &str) {
        log::info!(target: "hel", "{}", text);
    }
}

// ============================================================================
// Tests
// ============================================================================
