// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Handles and Descriptors
//!
//! A handle is an opaque number naming a capability inside one capability
//! space. The capability itself is a [`Descriptor`]: a closed sum over every
//! kind of kernel object, each variant holding a shared reference.
//!
//! # Design
//!
//! - **Immutable tag**: the variant of a descriptor never changes; cloning a
//!   descriptor clones the reference, not the object
//! - **Checked narrowing**: the `as_*` accessors fail with `BadDescriptor` on
//!   a kind mismatch and are the only way to reach the object
//! - **Reserved handles**: `0` is the null handle, `u64::MAX` names the
//!   caller's own capability space

use alloc::sync::Arc;
use core::fmt;

use crate::error::{HelError, HelResult};
use crate::interrupt::IrqLine;
use crate::object::{
    AddressSpace, Endpoint, EventHub, IoSpace, Memory, RdFolder, RingBuffer, Server, Universe,
};
use crate::sched::Thread;

/// ============================================================================
/// Handle
/// ============================================================================

/// Capability handle, valid only within one capability space
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Null handle (never attached)
    pub const NULL: Self = Self(0);

    /// The calling thread's own capability space
    pub const THIS_UNIVERSE: Self = Self(u64::MAX);

    /// Create from raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get raw value
    pub const fn into_raw(self) -> u64 {
        self.0
    }

    /// Check if this is the null handle
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// ============================================================================
/// Descriptor Kind
/// ============================================================================

/// Kind of a descriptor
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Memory = 1,
    AddressSpace = 2,
    Thread = 3,
    Universe = 4,
    EventHub = 5,
    Endpoint = 6,
    Server = 7,
    Client = 8,
    Directory = 9,
    Irq = 10,
    Io = 11,
    Ring = 12,
}

impl DescriptorKind {
    /// Get raw value
    pub const fn into_raw(self) -> u32 {
        self as u32
    }

    /// Get name as string
    pub const fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::AddressSpace => "address-space",
            Self::Thread => "thread",
            Self::Universe => "universe",
            Self::EventHub => "event-hub",
            Self::Endpoint => "endpoint",
            Self::Server => "server",
            Self::Client => "client",
            Self::Directory => "directory",
            Self::Irq => "irq",
            Self::Io => "io",
            Self::Ring => "ring",
        }
    }
}

/// ============================================================================
/// Descriptor
/// ============================================================================

/// Tagged reference to a kernel object
#[derive(Clone)]
pub enum Descriptor {
    Memory(Arc<Memory>),
    AddressSpace(Arc<AddressSpace>),
    Thread(Arc<Thread>),
    Universe(Arc<Universe>),
    EventHub(Arc<EventHub>),
    Endpoint(Arc<Endpoint>),
    /// Accepting side of a server
    Server(Arc<Server>),
    /// Connecting side of a server
    Client(Arc<Server>),
    Directory(Arc<RdFolder>),
    Irq(Arc<IrqLine>),
    Io(Arc<IoSpace>),
    Ring(Arc<RingBuffer>),
}

macro_rules! descriptor_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        /// Narrow to the expected kind, failing with `BadDescriptor`
        pub fn $name(&self) -> HelResult<&Arc<$ty>> {
            match self {
                Self::$variant(object) => Ok(object),
                _ => Err(HelError::BadDescriptor),
            }
        }
    };
}

impl Descriptor {
    /// Get the descriptor's kind
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Self::Memory(_) => DescriptorKind::Memory,
            Self::AddressSpace(_) => DescriptorKind::AddressSpace,
            Self::Thread(_) => DescriptorKind::Thread,
            Self::Universe(_) => DescriptorKind::Universe,
            Self::EventHub(_) => DescriptorKind::EventHub,
            Self::Endpoint(_) => DescriptorKind::Endpoint,
            Self::Server(_) => DescriptorKind::Server,
            Self::Client(_) => DescriptorKind::Client,
            Self::Directory(_) => DescriptorKind::Directory,
            Self::Irq(_) => DescriptorKind::Irq,
            Self::Io(_) => DescriptorKind::Io,
            Self::Ring(_) => DescriptorKind::Ring,
        }
    }

    /// Check the descriptor's kind
    pub fn is(&self, kind: DescriptorKind) -> bool {
        self.kind() == kind
    }

    descriptor_accessor!(as_memory, Memory, Memory);
    descriptor_accessor!(as_address_space, AddressSpace, AddressSpace);
    descriptor_accessor!(as_thread, Thread, Thread);
    descriptor_accessor!(as_universe, Universe, Universe);
    descriptor_accessor!(as_event_hub, EventHub, EventHub);
    descriptor_accessor!(as_endpoint, Endpoint, Endpoint);
    descriptor_accessor!(as_server, Server, Server);
    descriptor_accessor!(as_client, Client, Server);
    descriptor_accessor!(as_directory, Directory, RdFolder);
    descriptor_accessor!(as_irq, Irq, IrqLine);
    descriptor_accessor!(as_io, Io, IoSpace);
    descriptor_accessor!(as_ring, Ring, RingBuffer);
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Descriptor({})", self.kind().name())
    }
}

// ============================================================================
// Tests
// ============================================================================
