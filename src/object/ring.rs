// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Ring Buffers
//!
//! A ring collects received messages into buffers supplied by user space.
//! Messages are appended to the front buffer; a buffer that cannot hold the
//! next message is handed back through its completion hub and the next
//! queued buffer takes over.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{HelError, HelResult};
use crate::object::AsyncRingItem;
use crate::sync::SpinMutex;

/// Queue of user supplied buffers
pub struct RingBuffer {
    items: SpinMutex<VecDeque<AsyncRingItem>>,
}

impl RingBuffer {
    /// Create a ring with no buffers
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            items: SpinMutex::new(VecDeque::new()),
        })
    }

    /// Queue a buffer behind the existing ones
    pub fn submit_buffer(&self, item: AsyncRingItem) {
        self.items.lock().push_back(item);
    }

    /// Get the number of queued buffers
    pub fn buffer_count(&self) -> usize {
        self.items.lock().len()
    }

    /// Append `bytes` to the front buffer
    ///
    /// Returns the offset and length of the message inside that buffer.
    /// Full buffers are retired and completed after the lock is dropped.
    pub fn transfer(&self, bytes: &[u8]) -> HelResult<(usize, usize)> {
        let mut retired: Vec<AsyncRingItem> = Vec::new();
        let result = {
            let mut items = self.items.lock();
            loop {
                let Some(front) = items.front_mut() else {
                    break Err(HelError::BufferTooSmall);
                };
                if bytes.len() <= front.remaining() {
                    let offset = front.buffer.len();
                    front.buffer.extend_from_slice(bytes);
                    break Ok((offset, bytes.len()));
                }
                if front.buffer.is_empty() {
                    // Would not fit even into a fresh buffer
                    break Err(HelError::BufferTooSmall);
                }
                if let Some(full) = items.pop_front() {
                    retired.push(full);
                }
            }
        };

        for item in retired {
            log::trace!("ring: retiring buffer with {} bytes", item.buffer.len());
            item.complete();
        }
        result
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("buffers", &self.buffer_count())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
