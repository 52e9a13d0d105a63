// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Completion hub calls

use alloc::vec::Vec;

use super::Hel;
use crate::error::HelResult;
use crate::object::{AsyncEvent, Handle};
use crate::sched::{Deadline, Timer};

impl<'k> Hel<'k> {
    /// Drain up to `max` completed operations from a hub
    ///
    /// Blocks until at least one event is ready or `deadline` passes; a
    /// timeout returns an empty list. `max` is capped by the kernel
    /// configuration.
    pub fn wait_for_events(
        &self,
        hub: Handle,
        max: usize,
        deadline: Deadline,
    ) -> HelResult<Vec<AsyncEvent>> {
        let hub = self.hub(hub)?;
        let max = max.min(self.kernel.config().max_events_per_wait);

        if !hub.has_event() {
            if let Deadline::At(tick) = deadline {
                if !deadline.is_expired(self.kernel.now()) {
                    self.kernel.timers().install(Timer::new(tick, &self.thread));
                }
            }
            hub.block_until_event(
                &self.thread,
                deadline,
                self.kernel.clock(),
                self.kernel.scheduler(),
            );
        }

        let events = hub.drain(max);
        log::trace!(
            "hel: thread {} drained {} events from hub {}",
            self.thread.id(),
            events.len(),
            hub.id()
        );
        Ok(events)
    }
}

// ============================================================================
// Tests
// ============================================================================
