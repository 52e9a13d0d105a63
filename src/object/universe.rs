// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Capability Spaces (Universes)
//!
//! A universe is the descriptor table of one protection domain.
//!
//! # Design
//!
//! - **Single lock**: all table mutation is serialized by one spin lock
//! - **Fresh handles**: handles come from a per-table counter starting at 1,
//!   so a detached handle is never handed out again
//! - **Cross-space transfer**: both tables are locked in ascending universe
//!   id order, the only place two table locks are ever held together
//! - **Universe channel**: each universe owns a pipe; its own threads use
//!   the inferior end through `Handle::THIS_UNIVERSE`, holders of a universe
//!   descriptor use the superior end
//!
//! # Usage
//!
//! ```ignore
//! let universe = Universe::new();
//! let handle = universe.attach(Descriptor::EventHub(EventHub::new()));
//! let hub = universe.get(handle)?.as_event_hub()?.clone();
//! universe.detach(handle)?;
//! ```

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::{HelError, HelResult};
use crate::object::{Descriptor, Endpoint, Handle};
use crate::sync::{SpinMutex, SpinMutexGuard};

/// ============================================================================
/// Universe ID
/// ============================================================================

/// Universe identifier
pub type UniverseId = u64;

/// Allocate a new universe ID
fn alloc_universe_id() -> UniverseId {
    static NEXT_UNIVERSE_ID: AtomicU64 = AtomicU64::new(1);

    NEXT_UNIVERSE_ID.fetch_add(1, Ordering::Relaxed)
}

/// ============================================================================
/// Descriptor Table
/// ============================================================================

/// Handle to descriptor mapping
struct DescriptorTable {
    /// Live descriptors
    entries: BTreeMap<Handle, Descriptor>,

    /// Next handle to hand out
    next_handle: u64,
}

impl DescriptorTable {
    const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_handle: 1,
        }
    }

    fn attach(&mut self, descriptor: Descriptor) -> Handle {
        let handle = Handle::from_raw(self.next_handle);
        // Handle::THIS_UNIVERSE is the top of the range
        assert!(handle != Handle::THIS_UNIVERSE, "descriptor table exhausted");
        self.next_handle += 1;
        self.entries.insert(handle, descriptor);
        handle
    }

    fn get(&self, handle: Handle) -> HelResult<&Descriptor> {
        self.entries.get(&handle).ok_or(HelError::NoDescriptor)
    }

    fn detach(&mut self, handle: Handle) -> HelResult<Descriptor> {
        self.entries.remove(&handle).ok_or(HelError::NoDescriptor)
    }
}

/// ============================================================================
/// Universe
/// ============================================================================

/// Capability space
pub struct Universe {
    /// Universe ID
    id: UniverseId,

    /// Descriptor table
    table: SpinMutex<DescriptorTable>,

    /// End used by threads inside this universe
    inferior: Arc<Endpoint>,

    /// End used by holders of a universe descriptor
    superior: Arc<Endpoint>,
}

impl Universe {
    /// Create a new, empty capability space
    pub fn new() -> Arc<Self> {
        let (inferior, superior) = Endpoint::create_pair();
        let universe = Arc::new(Self {
            id: alloc_universe_id(),
            table: SpinMutex::new(DescriptorTable::new()),
            inferior,
            superior,
        });
        log::debug!("universe {}: created", universe.id);
        universe
    }

    /// Get the universe ID
    pub fn id(&self) -> UniverseId {
        self.id
    }

    /// Insert a descriptor and return its fresh handle
    pub fn attach(&self, descriptor: Descriptor) -> Handle {
        let handle = self.table.lock().attach(descriptor);
        log::trace!("universe {}: attach {}", self.id, handle);
        handle
    }

    /// Remove a descriptor, returning ownership of it
    pub fn detach(&self, handle: Handle) -> HelResult<Descriptor> {
        let descriptor = self.table.lock().detach(handle)?;
        log::trace!("universe {}: detach {}", self.id, handle);
        Ok(descriptor)
    }

    /// Get a copy of the descriptor behind `handle`
    pub fn get(&self, handle: Handle) -> HelResult<Descriptor> {
        self.table.lock().get(handle).cloned()
    }

    /// Run `f` on the descriptor while the table is locked
    ///
    /// `f` must not call into other locked objects.
    pub fn with_descriptor<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(&Descriptor) -> HelResult<R>,
    ) -> HelResult<R> {
        let table = self.table.lock();
        f(table.get(handle)?)
    }

    /// Attach a second handle to the same object in this table
    pub fn duplicate(&self, handle: Handle) -> HelResult<Handle> {
        let mut table = self.table.lock();
        let descriptor = table.get(handle)?.clone();
        Ok(table.attach(descriptor))
    }

    /// Attach the object behind `handle` to another capability space
    ///
    /// Both tables are locked in ascending id order.
    pub fn transfer(&self, handle: Handle, target: &Universe) -> HelResult<Handle> {
        if self.id == target.id {
            return self.duplicate(handle);
        }

        let (mut source, mut destination) = lock_pair(self, target);
        let descriptor = source.get(handle)?.clone();
        let new_handle = destination.attach(descriptor);
        log::trace!(
            "universe {}: transfer {} to universe {} as {}",
            self.id,
            handle,
            target.id,
            new_handle
        );
        Ok(new_handle)
    }

    /// Get the number of live descriptors
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.table.lock().entries.is_empty()
    }

    /// End of the universe channel used from inside the universe
    pub fn inferior_endpoint(&self) -> &Arc<Endpoint> {
        &self.inferior
    }

    /// End of the universe channel used by the universe's owner
    pub fn superior_endpoint(&self) -> &Arc<Endpoint> {
        &self.superior
    }
}

impl Drop for Universe {
    fn drop(&mut self) {
        log::debug!(
            "universe {}: destroyed with {} descriptors",
            self.id,
            self.table.get_mut().entries.len()
        );
    }
}

/// Lock two distinct tables in ascending id order
///
/// Returns the guards as (first argument, second argument).
fn lock_pair<'a>(
    a: &'a Universe,
    b: &'a Universe,
) -> (
    SpinMutexGuard<'a, DescriptorTable>,
    SpinMutexGuard<'a, DescriptorTable>,
) {
    if a.id < b.id {
        let first = a.table.lock();
        let second = b.table.lock();
        (first, second)
    } else {
        let first = b.table.lock();
        let second = a.table.lock();
        (second, first)
    }
}

// ============================================================================
// Tests
// ============================================================================
