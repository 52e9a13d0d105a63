// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Descriptor management calls

use alloc::sync::Arc;

use super::Hel;
use crate::error::HelResult;
use crate::object::{
    Descriptor, DescriptorKind, Endpoint, EventHub, Handle, RingBuffer, Server, Universe,
};

impl<'k> Hel<'k> {
    /// Resolve a universe handle, `THIS_UNIVERSE` naming the caller's own
    pub(crate) fn target_universe(&self, handle: Handle) -> HelResult<Arc<Universe>> {
        if handle == Handle::THIS_UNIVERSE {
            return Ok(self.universe().clone());
        }
        self.universe()
            .with_descriptor(handle, |d| d.as_universe().cloned())
    }

    /// Create an empty capability space
    pub fn create_universe(&self) -> Handle {
        self.universe().attach(Descriptor::Universe(Universe::new()))
    }

    /// Create a completion hub
    pub fn create_event_hub(&self) -> Handle {
        self.universe().attach(Descriptor::EventHub(EventHub::new()))
    }

    /// Create a connected pair of endpoints
    pub fn create_full_pipe(&self) -> (Handle, Handle) {
        let (first, second) = Endpoint::create_pair();
        let universe = self.universe();
        (
            universe.attach(Descriptor::Endpoint(first)),
            universe.attach(Descriptor::Endpoint(second)),
        )
    }

    /// Create a server, returning the (server, client) handles
    pub fn create_server(&self) -> (Handle, Handle) {
        let server = Server::new();
        let universe = self.universe();
        (
            universe.attach(Descriptor::Server(server.clone())),
            universe.attach(Descriptor::Client(server)),
        )
    }

    /// Create a ring with no buffers
    pub fn create_ring(&self) -> Handle {
        self.universe().attach(Descriptor::Ring(RingBuffer::new()))
    }

    /// Attach the object behind `handle` to another capability space
    pub fn transfer_descriptor(&self, handle: Handle, universe: Handle) -> HelResult<Handle> {
        let target = self.target_universe(universe)?;
        self.universe().transfer(handle, &target)
    }

    /// Attach a second handle to the same object
    pub fn duplicate_descriptor(&self, handle: Handle) -> HelResult<Handle> {
        self.universe().duplicate(handle)
    }

    /// Get the kind of a descriptor
    pub fn descriptor_info(&self, handle: Handle) -> HelResult<DescriptorKind> {
        self.universe().with_descriptor(handle, |d| Ok(d.kind()))
    }

    /// Detach a descriptor
    ///
    /// The object dies with its last descriptor.
    pub fn close_descriptor(&self, handle: Handle) -> HelResult<()> {
        let descriptor = self.universe().detach(handle)?;
        // Dropped outside the table lock; may close an endpoint
        drop(descriptor);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
