// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Completion dispatch loop
//!
//! A [`Dispatcher`] owns one hub handle and a completion callback per
//! in-flight operation. Each [`Dispatcher::dispatch`] call drains the hub
//! once and runs the callbacks of the drained events in order.
//!
//! # Usage
//!
//! ```ignore
//! let mut dispatcher = Dispatcher::new(hel.create_event_hub());
//! let hub = dispatcher.hub();
//! dispatcher.submit(
//!     hel.submit_recv_string(pipe, hub, 64, 0, 0, MsgFlags::REQUEST.bits(), SubmitInfo::NONE),
//!     |event| handle_request(event),
//! )?;
//! loop {
//!     dispatcher.dispatch(&hel, Deadline::Never)?;
//! }
//! ```

use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use crate::error::HelResult;
use crate::object::{AsyncEvent, Handle};
use crate::sched::Deadline;
use crate::syscall::Hel;

/// Events drained per dispatch call
pub const EVENTS_PER_CALL: usize = 16;

type Callback<'a> = Box<dyn FnOnce(AsyncEvent) + 'a>;

/// Runs per-operation callbacks for the events of one hub
pub struct Dispatcher<'a> {
    hub: Handle,
    pending: BTreeMap<i64, Callback<'a>>,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher draining `hub`
    pub fn new(hub: Handle) -> Self {
        Self {
            hub,
            pending: BTreeMap::new(),
        }
    }

    /// Get the hub handle submissions should report to
    pub fn hub(&self) -> Handle {
        self.hub
    }

    /// Register the callback for operation `async_id`
    pub fn on_complete(&mut self, async_id: i64, callback: impl FnOnce(AsyncEvent) + 'a) {
        if self.pending.insert(async_id, Box::new(callback)).is_some() {
            log::warn!("dispatch: callback for async {} replaced", async_id);
        }
    }

    /// Register `callback` if the submission succeeded
    ///
    /// A synchronous failure is returned as is and the callback is dropped.
    pub fn submit(
        &mut self,
        submission: HelResult<i64>,
        callback: impl FnOnce(AsyncEvent) + 'a,
    ) -> HelResult<i64> {
        let async_id = submission?;
        self.on_complete(async_id, callback);
        Ok(async_id)
    }

    /// Number of operations still waiting for their event
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for events on the hub and run their callbacks
    ///
    /// Returns the number of events drained, 0 when `deadline` passed first.
    pub fn dispatch(&mut self, hel: &Hel<'_>, deadline: Deadline) -> HelResult<usize> {
        let events = hel.wait_for_events(self.hub, EVENTS_PER_CALL, deadline)?;
        let count = events.len();

        for event in events {
            match self.pending.remove(&event.async_id) {
                Some(callback) => callback(event),
                None => log::warn!(
                    "dispatch: no callback for async {} ({:?}), dropped",
                    event.async_id,
                    event.kind
                ),
            }
        }
        Ok(count)
    }
}

// ============================================================================
// Tests
// ============================================================================
