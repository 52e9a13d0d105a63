// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Asynchronous Operations
//!
//! Every submitted request becomes one operation object. The object lives in
//! the wait structure of its target (a channel queue, an IRQ line, a memory
//! object, a server) until the target resolves it, and is then turned into an
//! [`AsyncEvent`] and pushed onto its completion hub.
//!
//! # Design
//!
//! - **Completed once**: `complete` takes the operation by value, so an
//!   operation cannot be completed twice or touched after completion
//! - **Weak hub**: an operation never keeps its hub alive; a completion whose
//!   hub is already gone is dropped with a warning
//! - **Flat record**: the event is a plain tagged record, decoupled from the
//!   kernel object that produced it

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

use crate::error::HelError;
use crate::object::{
    Descriptor, EventHub, Handle, MsgHeader, RecvFilter, RingBuffer, Universe,
};

/// ============================================================================
/// Submission Info
/// ============================================================================

/// Opaque user values echoed back in the completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitInfo {
    /// User completion routine address
    pub function: usize,
    /// User context pointer
    pub object: usize,
}

impl SubmitInfo {
    /// No user context
    pub const NONE: Self = Self {
        function: 0,
        object: 0,
    };

    /// Create new submission info
    pub const fn new(function: usize, object: usize) -> Self {
        Self { function, object }
    }
}

/// ============================================================================
/// Events
/// ============================================================================

/// Kind of a completed operation
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pager should load one page of a backed memory object
    LoadMemory = 1,
    /// A range of a memory object is loaded and locked
    LockMemory = 2,
    /// An observed thread trapped or exited
    Observe = 3,
    SendString = 4,
    SendDescriptor = 5,
    RecvString = 6,
    RecvStringToRing = 7,
    RecvDescriptor = 8,
    Accept = 9,
    Connect = 10,
    Irq = 11,
    /// A ring buffer was filled and handed back
    RingBuffer = 12,
}

/// What an observer saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The thread hit a trap and is suspended (or killed)
    Trap,
    /// The thread exited
    Exit,
}

/// Completion record of one asynchronous operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncEvent {
    /// Kind of operation
    pub kind: EventKind,
    /// Failure status, `None` on success
    pub error: Option<HelError>,
    /// Id returned by the submission call
    pub async_id: i64,
    /// User values passed at submission
    pub submit: SubmitInfo,
    /// Request id of the matched message
    pub msg_request: i64,
    /// Sequence id of the matched message
    pub msg_sequence: i64,
    /// Byte offset (memory, ring)
    pub offset: usize,
    /// Byte length (message, memory, ring)
    pub length: usize,
    /// Handle created in the receiver's capability space
    pub handle: Handle,
    /// Per-relay interrupt sequence number
    pub sequence: u64,
    /// Observation of an observe operation
    pub observation: Option<Observation>,
    /// Received bytes (string receives, filled ring buffers)
    pub payload: Vec<u8>,
}

impl AsyncEvent {
    /// Create an empty successful event
    pub fn new(kind: EventKind, async_id: i64, submit: SubmitInfo) -> Self {
        Self {
            kind,
            error: None,
            async_id,
            submit,
            msg_request: 0,
            msg_sequence: 0,
            offset: 0,
            length: 0,
            handle: Handle::NULL,
            sequence: 0,
            observation: None,
            payload: Vec::new(),
        }
    }

    /// Set the failure status
    pub fn with_error(mut self, error: HelError) -> Self {
        self.error = Some(error);
        self
    }

    /// Set the message ids
    pub fn with_message(mut self, header: &MsgHeader) -> Self {
        self.msg_request = header.request;
        self.msg_sequence = header.sequence;
        self
    }

    /// Status as a result
    pub fn result(&self) -> Result<(), HelError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// ============================================================================
/// Async Data
/// ============================================================================

/// Bookkeeping shared by every operation kind
#[derive(Debug)]
pub struct AsyncData {
    /// Hub receiving the completion
    hub: Weak<EventHub>,
    /// Id returned by the submission call
    async_id: i64,
    /// User values echoed in the completion
    submit: SubmitInfo,
}

impl AsyncData {
    /// Create new async data reporting to `hub`
    pub fn new(hub: &Arc<EventHub>, async_id: i64, submit: SubmitInfo) -> Self {
        Self {
            hub: Arc::downgrade(hub),
            async_id,
            submit,
        }
    }

    /// Get the async id
    pub fn async_id(&self) -> i64 {
        self.async_id
    }

    /// Start an event of `kind` carrying this operation's ids
    pub fn event(&self, kind: EventKind) -> AsyncEvent {
        AsyncEvent::new(kind, self.async_id, self.submit)
    }

    /// Deliver the completion to the hub
    pub fn complete(self, event: AsyncEvent) {
        match self.hub.upgrade() {
            Some(hub) => hub.enqueue(event),
            None => log::warn!(
                "async {}: hub destroyed, dropping {:?} completion",
                self.async_id,
                event.kind
            ),
        }
    }
}

/// ============================================================================
/// Message Operations
/// ============================================================================

/// Send of a byte string
#[derive(Debug)]
pub struct AsyncSendString {
    pub data: AsyncData,
    pub header: MsgHeader,
    /// Kernel copy of the message
    pub buffer: Vec<u8>,
}

/// Send of a descriptor
#[derive(Debug)]
pub struct AsyncSendDescriptor {
    pub data: AsyncData,
    pub header: MsgHeader,
    pub descriptor: Descriptor,
}

/// Where a received string goes
#[derive(Debug)]
pub enum RecvTarget {
    /// A caller buffer of at most `max_length` bytes
    Buffer { max_length: usize },
    /// Appended to the front buffer of a ring
    Ring(Arc<RingBuffer>),
}

/// Receive of a byte string
#[derive(Debug)]
pub struct AsyncRecvString {
    pub data: AsyncData,
    pub filter: RecvFilter,
    pub target: RecvTarget,
}

/// Receive of a descriptor
#[derive(Debug)]
pub struct AsyncRecvDescriptor {
    pub data: AsyncData,
    pub filter: RecvFilter,
    /// Capability space the received descriptor is attached to
    pub universe: Weak<Universe>,
}

/// Pending send on a channel
#[derive(Debug)]
pub enum AsyncSend {
    String(AsyncSendString),
    Descriptor(AsyncSendDescriptor),
}

impl AsyncSend {
    /// Message ids and flags
    pub fn header(&self) -> &MsgHeader {
        match self {
            Self::String(send) => &send.header,
            Self::Descriptor(send) => &send.header,
        }
    }

    /// Complete without delivery
    pub fn fail(self, error: HelError) {
        match self {
            Self::String(send) => {
                let event = send.data.event(EventKind::SendString).with_error(error);
                send.data.complete(event);
            }
            Self::Descriptor(send) => {
                let event = send.data.event(EventKind::SendDescriptor).with_error(error);
                send.data.complete(event);
            }
        }
    }
}

/// Pending receive on a channel
#[derive(Debug)]
pub enum AsyncRecv {
    String(AsyncRecvString),
    Descriptor(AsyncRecvDescriptor),
}

impl AsyncRecv {
    /// Filter the receive was submitted with
    pub fn filter(&self) -> &RecvFilter {
        match self {
            Self::String(recv) => &recv.filter,
            Self::Descriptor(recv) => &recv.filter,
        }
    }

    /// Check whether `send` may be delivered to this receive
    pub fn accepts(&self, send: &AsyncSend) -> bool {
        let same_payload = matches!(
            (self, send),
            (Self::String(_), AsyncSend::String(_))
                | (Self::Descriptor(_), AsyncSend::Descriptor(_))
        );
        same_payload && self.filter().matches(send.header())
    }

    /// Complete without delivery
    pub fn fail(self, error: HelError) {
        match self {
            Self::String(recv) => {
                let kind = match recv.target {
                    RecvTarget::Buffer { .. } => EventKind::RecvString,
                    RecvTarget::Ring(_) => EventKind::RecvStringToRing,
                };
                let event = recv.data.event(kind).with_error(error);
                recv.data.complete(event);
            }
            Self::Descriptor(recv) => {
                let event = recv.data.event(EventKind::RecvDescriptor).with_error(error);
                recv.data.complete(event);
            }
        }
    }
}

/// ============================================================================
/// Other Operations
/// ============================================================================

/// Server-side wait for a connection
#[derive(Debug)]
pub struct AsyncAccept {
    pub data: AsyncData,
    pub universe: Weak<Universe>,
}

/// Client-side connection request
#[derive(Debug)]
pub struct AsyncConnect {
    pub data: AsyncData,
    pub universe: Weak<Universe>,
}

/// Wait for the next interrupt on a line
#[derive(Debug)]
pub struct AsyncIrq {
    pub data: AsyncData,
}

impl AsyncIrq {
    /// Create a new irq wait
    pub fn new(data: AsyncData) -> Self {
        Self { data }
    }

    /// Complete with the relay's sequence number
    pub fn complete(self, sequence: u64) {
        let mut event = self.data.event(EventKind::Irq);
        event.sequence = sequence;
        self.data.complete(event);
    }
}

/// Pager request for a page of a backed memory object
#[derive(Debug)]
pub struct AsyncHandleLoad {
    pub data: AsyncData,
}

impl AsyncHandleLoad {
    /// Create a new pager request
    pub fn new(data: AsyncData) -> Self {
        Self { data }
    }

    /// Ask the pager to load `[offset, offset + length)`
    pub fn complete(self, offset: usize, length: usize) {
        let mut event = self.data.event(EventKind::LoadMemory);
        event.offset = offset;
        event.length = length;
        self.data.complete(event);
    }
}

/// Request to have a memory range loaded and locked
#[derive(Debug)]
pub struct AsyncInitiateLoad {
    pub data: AsyncData,
    pub offset: usize,
    pub length: usize,
}

impl AsyncInitiateLoad {
    /// Create a new lock request
    pub fn new(data: AsyncData, offset: usize, length: usize) -> Self {
        Self {
            data,
            offset,
            length,
        }
    }

    /// Report the range as locked
    pub fn complete(self) {
        let mut event = self.data.event(EventKind::LockMemory);
        event.offset = self.offset;
        event.length = self.length;
        self.data.complete(event);
    }
}

/// Observer of a thread
#[derive(Debug)]
pub struct AsyncObserve {
    pub data: AsyncData,
}

impl AsyncObserve {
    /// Create a new observer
    pub fn new(data: AsyncData) -> Self {
        Self { data }
    }

    /// Report what happened to the thread
    pub fn complete(self, observation: Observation) {
        let mut event = self.data.event(EventKind::Observe);
        event.observation = Some(observation);
        self.data.complete(event);
    }
}

/// A buffer handed to a ring
#[derive(Debug)]
pub struct AsyncRingItem {
    pub data: AsyncData,
    /// Capacity in bytes
    pub capacity: usize,
    /// Bytes written so far
    pub buffer: Vec<u8>,
}

impl AsyncRingItem {
    /// Create a new, empty ring buffer item
    ///
    /// The buffer grows as messages are appended.
    pub fn new(data: AsyncData, capacity: usize) -> Self {
        Self {
            data,
            capacity,
            buffer: Vec::new(),
        }
    }

    /// Bytes still free
    pub fn remaining(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Hand the filled buffer back
    pub fn complete(self) {
        let mut event = self.data.event(EventKind::RingBuffer);
        event.length = self.buffer.len();
        event.payload = self.buffer;
        self.data.complete(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
