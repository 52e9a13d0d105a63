// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Memory Objects
//!
//! Only the part of a memory object visible to the message core is modelled:
//! its size and, for backed memory, the per-page load state driven by a
//! user-space pager.
//!
//! # Design
//!
//! - **Allocated / on-demand memory** is always loaded; lock requests
//!   complete immediately
//! - **Backed memory** starts with every page missing. A lock request waits
//!   until every page in its range is loaded. Missing pages inside a pending
//!   lock range are handed to pending pager requests one page at a time;
//!   the pager answers with `complete_load`
//!
//! # Usage
//!
//! ```ignore
//! memory.submit_handle_load(AsyncHandleLoad::new(pager_data));
//! memory.submit_initiate_load(AsyncInitiateLoad::new(data, 0, PAGE_SIZE));
//! // pager receives LoadMemory(0, PAGE_SIZE), fills the page, then:
//! memory.complete_load(0, PAGE_SIZE)?;
//! ```

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{HelError, HelResult};
use crate::object::{AsyncHandleLoad, AsyncInitiateLoad};
use crate::sync::SpinMutex;

/// Size of one page in bytes
pub const PAGE_SIZE: usize = 4096;

/// Kind of memory object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    /// Physical memory allocated up front
    Allocated,
    /// Zero-filled on first touch
    OnDemand,
    /// Filled by a user-space pager
    Backed,
}

/// Load state of one page of backed memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageState {
    Missing,
    /// Handed to the pager, not yet loaded
    Requested,
    Loaded,
}

struct MemoryInner {
    /// Per-page state; empty unless the memory is backed
    pages: Vec<PageState>,
    /// Idle pager requests
    handlers: VecDeque<AsyncHandleLoad>,
    /// Lock requests waiting for their range
    locks: Vec<AsyncInitiateLoad>,
}

impl MemoryInner {
    fn range_loaded(&self, offset: usize, length: usize) -> bool {
        page_range(offset, length).all(|page| self.pages[page] == PageState::Loaded)
    }

    /// First missing page covered by a pending lock request
    fn next_wanted(&self) -> Option<usize> {
        self.locks.iter().find_map(|lock| {
            page_range(lock.offset, lock.length).find(|&page| self.pages[page] == PageState::Missing)
        })
    }

    /// Pair idle pager requests with wanted pages
    fn dispatch_pager(&mut self) -> Vec<(AsyncHandleLoad, usize)> {
        let mut requests = Vec::new();
        while !self.handlers.is_empty() {
            let Some(page) = self.next_wanted() else {
                break;
            };
            let Some(handler) = self.handlers.pop_front() else {
                break;
            };
            self.pages[page] = PageState::Requested;
            requests.push((handler, page));
        }
        requests
    }
}

/// Page indices covering `[offset, offset + length)`
fn page_range(offset: usize, length: usize) -> core::ops::Range<usize> {
    let first = offset / PAGE_SIZE;
    let last = (offset + length).div_ceil(PAGE_SIZE);
    first..last
}

/// Memory object
pub struct Memory {
    kind: MemoryKind,
    num_pages: usize,
    inner: SpinMutex<MemoryInner>,
}

impl Memory {
    /// Create a memory object of `num_pages` pages
    pub fn new(kind: MemoryKind, num_pages: usize) -> Arc<Self> {
        let pages = match kind {
            MemoryKind::Backed => vec![PageState::Missing; num_pages],
            MemoryKind::Allocated | MemoryKind::OnDemand => Vec::new(),
        };
        log::debug!("memory: created {:?} object of {} pages", kind, num_pages);
        Arc::new(Self {
            kind,
            num_pages,
            inner: SpinMutex::new(MemoryInner {
                pages,
                handlers: VecDeque::new(),
                locks: Vec::new(),
            }),
        })
    }

    /// Get the memory kind
    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Get the size in pages
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// Get the size in bytes
    pub fn size(&self) -> usize {
        self.num_pages * PAGE_SIZE
    }

    fn check_range(&self, offset: usize, length: usize) -> HelResult<()> {
        match offset.checked_add(length) {
            Some(end) if end <= self.size() => Ok(()),
            _ => Err(HelError::IllegalArgs),
        }
    }

    /// Register a pager request
    pub fn submit_handle_load(&self, handler: AsyncHandleLoad) {
        let requests = {
            let mut inner = self.inner.lock();
            inner.handlers.push_back(handler);
            inner.dispatch_pager()
        };
        complete_requests(requests);
    }

    /// Register a lock request for `[offset, offset + length)`
    pub fn submit_initiate_load(&self, request: AsyncInitiateLoad) -> HelResult<()> {
        self.check_range(request.offset, request.length)?;
        if self.kind != MemoryKind::Backed {
            request.complete();
            return Ok(());
        }

        let (ready, requests) = {
            let mut inner = self.inner.lock();
            if inner.range_loaded(request.offset, request.length) {
                (Some(request), Vec::new())
            } else {
                inner.locks.push(request);
                (None, inner.dispatch_pager())
            }
        };

        complete_requests(requests);
        if let Some(request) = ready {
            request.complete();
        }
        Ok(())
    }

    /// Mark `[offset, offset + length)` as loaded
    ///
    /// Completes every lock request whose range is now fully loaded.
    pub fn complete_load(&self, offset: usize, length: usize) -> HelResult<()> {
        self.check_range(offset, length)?;
        if self.kind != MemoryKind::Backed {
            return Ok(());
        }

        let ready = {
            let mut inner = self.inner.lock();
            for page in page_range(offset, length) {
                inner.pages[page] = PageState::Loaded;
            }
            let locks = core::mem::take(&mut inner.locks);
            let (ready, waiting): (Vec<_>, Vec<_>) = locks
                .into_iter()
                .partition(|lock| inner.range_loaded(lock.offset, lock.length));
            inner.locks = waiting;
            ready
        };

        log::trace!(
            "memory: loaded {:#x}+{:#x}, {} lock requests ready",
            offset,
            length,
            ready.len()
        );
        for request in ready {
            request.complete();
        }
        Ok(())
    }

    /// Check whether every page in range is loaded
    pub fn is_loaded(&self, offset: usize, length: usize) -> HelResult<bool> {
        self.check_range(offset, length)?;
        if self.kind != MemoryKind::Backed {
            return Ok(true);
        }
        Ok(self.inner.lock().range_loaded(offset, length))
    }

    /// Get the number of lock requests still waiting
    pub fn pending_locks(&self) -> usize {
        self.inner.lock().locks.len()
    }
}

fn complete_requests(requests: Vec<(AsyncHandleLoad, usize)>) {
    for (handler, page) in requests {
        handler.complete(page * PAGE_SIZE, PAGE_SIZE);
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("kind", &self.kind)
            .field("num_pages", &self.num_pages)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{AsyncData, EventHub, EventKind, SubmitInfo};

    #[test]
    fn test_allocated_memory_locks_immediately() {
        let hub = EventHub::new();
        let memory = Memory::new(MemoryKind::Allocated, 2);
        assert_eq!(memory.size(), 2 * PAGE_SIZE);

        memory
            .submit_initiate_load(AsyncInitiateLoad::new(
                AsyncData::new(&hub, 1, SubmitInfo::NONE),
                0,
                2 * PAGE_SIZE,
            ))
            .unwrap();
        let event = hub.dequeue_event().unwrap();
        assert_eq!(event.kind, EventKind::LockMemory);
        assert_eq!(event.length, 2 * PAGE_SIZE);
    }

    #[test]
    fn test_backed_memory_pager_protocol() {
        let hub = EventHub::new();
        let pager = EventHub::new();
        let memory = Memory::new(MemoryKind::Backed, 4);

        memory.submit_handle_load(AsyncHandleLoad::new(AsyncData::new(&pager, 1, SubmitInfo::NONE)));
        assert!(!pager.has_event());

        memory
            .submit_initiate_load(AsyncInitiateLoad::new(
                AsyncData::new(&hub, 2, SubmitInfo::NONE),
                PAGE_SIZE,
                2 * PAGE_SIZE,
            ))
            .unwrap();
        assert!(!hub.has_event());

        let request = pager.dequeue_event().unwrap();
        assert_eq!(request.kind, EventKind::LoadMemory);
        assert_eq!((request.offset, request.length), (PAGE_SIZE, PAGE_SIZE));
        memory.complete_load(PAGE_SIZE, PAGE_SIZE).unwrap();
        assert!(!hub.has_event());

        // Second page goes to the next pager request
        memory.submit_handle_load(AsyncHandleLoad::new(AsyncData::new(&pager, 3, SubmitInfo::NONE)));
        let request = pager.dequeue_event().unwrap();
        assert_eq!(request.offset, 2 * PAGE_SIZE);
        memory.complete_load(2 * PAGE_SIZE, PAGE_SIZE).unwrap();

        let locked = hub.dequeue_event().unwrap();
        assert_eq!(locked.kind, EventKind::LockMemory);
        assert_eq!(locked.async_id, 2);
        assert_eq!(memory.pending_locks(), 0);
        assert_eq!(memory.is_loaded(0, PAGE_SIZE), Ok(false));
    }

    #[test]
    fn test_out_of_range() {
        let hub = EventHub::new();
        let memory = Memory::new(MemoryKind::Backed, 1);
        assert_eq!(
            memory.submit_initiate_load(AsyncInitiateLoad::new(
                AsyncData::new(&hub, 1, SubmitInfo::NONE),
                PAGE_SIZE,
                PAGE_SIZE,
            )),
            Err(HelError::IllegalArgs)
        );
        assert_eq!(memory.complete_load(0, 2 * PAGE_SIZE), Err(HelError::IllegalArgs));
    }

    #[test]
    fn test_unbacked_memory_keeps_no_page_state() {
        let memory = Memory::new(MemoryKind::OnDemand, 1 << 20);
        assert!(memory.inner.lock().pages.is_empty());
        assert_eq!(memory.is_loaded(0, memory.size()), Ok(true));
        assert_eq!(memory.complete_load(0, PAGE_SIZE), Ok(()));
    }
}
