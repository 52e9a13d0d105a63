// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Memory calls

use super::Hel;
use crate::error::{HelError, HelResult};
use crate::object::{
    AddressSpace, AsyncHandleLoad, AsyncInitiateLoad, Descriptor, Handle, Memory, MemoryKind,
    SubmitInfo, PAGE_SIZE,
};

/// Check that a byte range is page aligned
fn check_aligned(offset: usize, length: usize) -> HelResult<()> {
    if offset % PAGE_SIZE != 0 || length % PAGE_SIZE != 0 {
        return Err(HelError::IllegalArgs);
    }
    Ok(())
}

impl<'k> Hel<'k> {
    /// Create a memory object of `size` bytes
    pub fn allocate_memory(&self, size: usize, kind: MemoryKind) -> HelResult<Handle> {
        if size == 0 || size % PAGE_SIZE != 0 || size > self.kernel.config().max_memory_size {
            return Err(HelError::IllegalArgs);
        }
        let memory = Memory::new(kind, size / PAGE_SIZE);
        Ok(self.universe().attach(Descriptor::Memory(memory)))
    }

    /// Create an empty address space
    pub fn create_space(&self) -> Handle {
        self.universe()
            .attach(Descriptor::AddressSpace(AddressSpace::new()))
    }

    /// Get the size of a memory object in bytes
    pub fn memory_info(&self, memory: Handle) -> HelResult<usize> {
        self.universe()
            .with_descriptor(memory, |d| d.as_memory().map(|memory| memory.size()))
    }

    /// Offer to load one page of a backed memory object
    pub fn submit_handle_load(
        &self,
        memory: Handle,
        hub: Handle,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        let memory = self
            .universe()
            .with_descriptor(memory, |d| d.as_memory().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;
        memory.submit_handle_load(AsyncHandleLoad::new(data));
        Ok(async_id)
    }

    /// Wait until `[offset, offset + size)` is loaded
    pub fn submit_lock_memory(
        &self,
        memory: Handle,
        hub: Handle,
        offset: usize,
        size: usize,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        check_aligned(offset, size)?;
        let memory = self
            .universe()
            .with_descriptor(memory, |d| d.as_memory().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;
        memory.submit_initiate_load(AsyncInitiateLoad::new(data, offset, size))?;
        Ok(async_id)
    }

    /// Report a range of a backed memory object as loaded
    pub fn complete_load(&self, memory: Handle, offset: usize, size: usize) -> HelResult<()> {
        check_aligned(offset, size)?;
        let memory = self
            .universe()
            .with_descriptor(memory, |d| d.as_memory().cloned())?;
        memory.complete_load(offset, size)
    }
}

// ============================================================================
// Tests
// ============================================================================
