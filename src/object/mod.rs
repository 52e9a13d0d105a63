// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Objects & IPC
//!
//! Capability spaces, descriptors, channels and the completion machinery
//! every asynchronous operation reports through.
//!
//! # Design
//!
//! - **Capability-based access**: user space names objects only through
//!   handles into its capability space
//! - **Asynchronous operations**: every request that may wait becomes an
//!   operation object queued on its target and completed onto a hub
//! - **Reference counting**: objects die with their last descriptor; wait
//!   structures hold weak references where ownership would form a cycle
//!
//! # Modules
//!
//! - [`descriptor`] - Handles and descriptors
//! - [`universe`] - Capability spaces
//! - [`async_op`] - Asynchronous operations and completion records
//! - [`event_hub`] - Completion hubs
//! - [`channel`] - Message channels
//! - [`endpoint`] - Bidirectional endpoints
//! - [`server`] - Accept/connect rendezvous
//! - [`ring`] - Receive-to-ring buffers
//! - [`memory`] - Memory objects and the pager protocol
//! - [`rd`] - Resource directories
//! - [`io`] - I/O port spaces
//! - [`address_space`] - Address spaces

pub mod address_space;
pub mod async_op;
pub mod channel;
pub mod descriptor;
pub mod endpoint;
pub mod event_hub;
pub mod io;
pub mod memory;
pub mod rd;
pub mod ring;
pub mod server;
pub mod universe;

// Re-exports
pub use address_space::{AddressSpace, SpaceId};
pub use async_op::{
    AsyncAccept, AsyncConnect, AsyncData, AsyncEvent, AsyncHandleLoad, AsyncInitiateLoad,
    AsyncIrq, AsyncObserve, AsyncRecv, AsyncRecvDescriptor, AsyncRecvString, AsyncRingItem,
    AsyncSend, AsyncSendDescriptor, AsyncSendString, EventKind, Observation, RecvTarget,
    SubmitInfo,
};
pub use channel::{Channel, ChannelSide, MsgFlags, MsgHeader, RecvFilter};
pub use descriptor::{Descriptor, DescriptorKind, Handle};
pub use endpoint::{Endpoint, FullPipe};
pub use event_hub::{EventHub, HubId};
pub use io::IoSpace;
pub use memory::{Memory, MemoryKind, PAGE_SIZE};
pub use rd::{RdEntry, RdFolder, THIS_DIRECTORY};
pub use ring::RingBuffer;
pub use server::Server;
pub use universe::{Universe, UniverseId};
