// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Message Channels
//!
//! A channel is one direction of a full pipe: a queue of pending sends and a
//! queue of pending receives. When both queues hold a compatible pair the
//! message is transferred and both operations complete.
//!
//! # Design
//!
//! - **FIFO matching**: a new send is matched with the oldest pending receive
//!   that accepts it, and vice versa
//! - **Filtered receives**: a receive only accepts messages whose flags
//!   intersect its own and whose request and sequence ids match (0 matches
//!   anything)
//! - **Unlocked transfer**: the pair is removed under the channel lock, but
//!   the copy and both completions happen after the lock is dropped
//! - **Two-sided close**: closing one side fails everything queued; later
//!   submissions fail synchronously on the closed side and asynchronously on
//!   the other
//!
//! # Usage
//!
//! ```ignore
//! channel.submit_recv(AsyncRecv::String(recv))?;
//! channel.send(AsyncSend::String(send))?;
//! // both completions are now on their hubs
//! ```

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{HelError, HelResult};
use crate::object::{
    AsyncRecv, AsyncRecvDescriptor, AsyncRecvString, AsyncSend, AsyncSendDescriptor,
    AsyncSendString, EventKind, RecvTarget,
};
use crate::sync::SpinMutex;

/// ============================================================================
/// Message Header
/// ============================================================================

bitflags::bitflags! {
    /// Message flags
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MsgFlags: u32 {
        /// Message is a request
        const REQUEST = 0x01;
        /// Message is a response
        const RESPONSE = 0x02;
    }
}

impl MsgFlags {
    /// Validate flags passed from user space
    pub fn from_user(bits: u32) -> HelResult<Self> {
        match Self::from_bits(bits) {
            Some(flags) if !flags.is_empty() => Ok(flags),
            _ => Err(HelError::IllegalArgs),
        }
    }
}

/// Routing information carried by a send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHeader {
    pub flags: MsgFlags,
    pub request: i64,
    pub sequence: i64,
}

impl MsgHeader {
    /// Create a new header
    pub const fn new(flags: MsgFlags, request: i64, sequence: i64) -> Self {
        Self {
            flags,
            request,
            sequence,
        }
    }
}

/// Selection criteria of a receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvFilter {
    pub flags: MsgFlags,
    /// Required request id, 0 for any
    pub request: i64,
    /// Required sequence id, 0 for any
    pub sequence: i64,
}

impl RecvFilter {
    /// Create a new filter
    pub const fn new(flags: MsgFlags, request: i64, sequence: i64) -> Self {
        Self {
            flags,
            request,
            sequence,
        }
    }

    /// Check whether a message with `header` passes the filter
    pub fn matches(&self, header: &MsgHeader) -> bool {
        self.flags.intersects(header.flags)
            && (self.request == 0 || self.request == header.request)
            && (self.sequence == 0 || self.sequence == header.sequence)
    }
}

/// ============================================================================
/// Channel
/// ============================================================================

/// Side of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSide {
    /// The side submitting sends
    Writer,
    /// The side submitting receives
    Reader,
}

/// Queues and close state
struct ChannelInner {
    sends: VecDeque<AsyncSend>,
    recvs: VecDeque<AsyncRecv>,
    writer_closed: bool,
    reader_closed: bool,
}

/// One direction of a full pipe
pub struct Channel {
    inner: SpinMutex<ChannelInner>,
}

impl Channel {
    /// Create a new, open channel
    pub const fn new() -> Self {
        Self {
            inner: SpinMutex::new(ChannelInner {
                sends: VecDeque::new(),
                recvs: VecDeque::new(),
                writer_closed: false,
                reader_closed: false,
            }),
        }
    }

    /// Submit a send
    ///
    /// Fails synchronously with `ClosedLocally` if the writer side is
    /// closed. If the reader side is closed the send completes with
    /// `ClosedRemotely`.
    pub fn send(&self, send: AsyncSend) -> HelResult<()> {
        let (send, recv) = {
            let mut inner = self.inner.lock();
            if inner.writer_closed {
                return Err(HelError::ClosedLocally);
            }
            if inner.reader_closed {
                drop(inner);
                send.fail(HelError::ClosedRemotely);
                return Ok(());
            }

            let matched = inner
                .recvs
                .iter()
                .position(|recv| recv.accepts(&send))
                .and_then(|index| inner.recvs.remove(index));
            match matched {
                Some(recv) => (send, recv),
                None => {
                    inner.sends.push_back(send);
                    return Ok(());
                }
            }
        };

        transfer(send, recv);
        Ok(())
    }

    /// Submit a receive
    ///
    /// Fails synchronously with `ClosedLocally` if the reader side is
    /// closed. If the writer side is closed the receive completes with
    /// `ClosedRemotely`.
    pub fn submit_recv(&self, recv: AsyncRecv) -> HelResult<()> {
        let (send, recv) = {
            let mut inner = self.inner.lock();
            if inner.reader_closed {
                return Err(HelError::ClosedLocally);
            }
            if inner.writer_closed {
                drop(inner);
                recv.fail(HelError::ClosedRemotely);
                return Ok(());
            }

            let matched = inner
                .sends
                .iter()
                .position(|send| recv.accepts(send))
                .and_then(|index| inner.sends.remove(index));
            match matched {
                Some(send) => (send, recv),
                None => {
                    inner.recvs.push_back(recv);
                    return Ok(());
                }
            }
        };

        transfer(send, recv);
        Ok(())
    }

    /// Close one side and fail everything queued
    ///
    /// Operations submitted by the closing side fail with `ClosedLocally`,
    /// those of the other side with `ClosedRemotely`. Closing twice is a
    /// no-op.
    pub fn close(&self, side: ChannelSide) {
        let (sends, recvs) = {
            let mut inner = self.inner.lock();
            let already = match side {
                ChannelSide::Writer => core::mem::replace(&mut inner.writer_closed, true),
                ChannelSide::Reader => core::mem::replace(&mut inner.reader_closed, true),
            };
            if already {
                return;
            }
            let sends: Vec<AsyncSend> = inner.sends.drain(..).collect();
            let recvs: Vec<AsyncRecv> = inner.recvs.drain(..).collect();
            (sends, recvs)
        };

        let (send_error, recv_error) = match side {
            ChannelSide::Writer => (HelError::ClosedLocally, HelError::ClosedRemotely),
            ChannelSide::Reader => (HelError::ClosedRemotely, HelError::ClosedLocally),
        };
        log::trace!(
            "channel: {:?} closed, failing {} sends and {} receives",
            side,
            sends.len(),
            recvs.len()
        );
        for send in sends {
            send.fail(send_error);
        }
        for recv in recvs {
            recv.fail(recv_error);
        }
    }

    /// Check whether a side is closed
    pub fn is_closed(&self, side: ChannelSide) -> bool {
        let inner = self.inner.lock();
        match side {
            ChannelSide::Writer => inner.writer_closed,
            ChannelSide::Reader => inner.reader_closed,
        }
    }

    /// Get the number of queued sends
    pub fn pending_sends(&self) -> usize {
        self.inner.lock().sends.len()
    }

    /// Get the number of queued receives
    pub fn pending_recvs(&self) -> usize {
        self.inner.lock().recvs.len()
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Channel")
            .field("sends", &inner.sends.len())
            .field("recvs", &inner.recvs.len())
            .field("writer_closed", &inner.writer_closed)
            .field("reader_closed", &inner.reader_closed)
            .finish()
    }
}

/// ============================================================================
/// Transfer
/// ============================================================================

/// Deliver a matched pair; called without the channel lock held
fn transfer(send: AsyncSend, recv: AsyncRecv) {
    match (send, recv) {
        (AsyncSend::String(send), AsyncRecv::String(recv)) => transfer_string(send, recv),
        (AsyncSend::Descriptor(send), AsyncRecv::Descriptor(recv)) => {
            transfer_descriptor(send, recv)
        }
        _ => unreachable!("matched send and receive of different payload kinds"),
    }
}

fn transfer_string(send: AsyncSendString, recv: AsyncRecvString) {
    let AsyncSendString {
        data: send_data,
        header,
        buffer,
    } = send;
    let length = buffer.len();

    match recv.target {
        RecvTarget::Buffer { max_length } => {
            let mut event = recv.data.event(EventKind::RecvString).with_message(&header);
            event.length = length;
            if length > max_length {
                log::debug!(
                    "channel: {} byte message does not fit {} byte buffer",
                    length,
                    max_length
                );
                event.error = Some(HelError::BufferTooSmall);
            } else {
                event.payload = buffer;
            }
            recv.data.complete(event);
        }
        RecvTarget::Ring(ring) => {
            let mut event = recv
                .data
                .event(EventKind::RecvStringToRing)
                .with_message(&header);
            match ring.transfer(&buffer) {
                Ok((offset, length)) => {
                    event.offset = offset;
                    event.length = length;
                }
                Err(error) => {
                    event.length = length;
                    event.error = Some(error);
                }
            }
            recv.data.complete(event);
        }
    }

    let event = send_data.event(EventKind::SendString).with_message(&header);
    send_data.complete(event);
}

fn transfer_descriptor(send: AsyncSendDescriptor, recv: AsyncRecvDescriptor) {
    let AsyncSendDescriptor {
        data: send_data,
        header,
        descriptor,
    } = send;

    let mut event = recv
        .data
        .event(EventKind::RecvDescriptor)
        .with_message(&header);
    match recv.universe.upgrade() {
        Some(universe) => event.handle = universe.attach(descriptor),
        None => {
            log::warn!(
                "channel: receiver universe destroyed, dropping {:?}",
                descriptor
            );
            event.error = Some(HelError::ClosedLocally);
        }
    }
    recv.data.complete(event);

    let event = send_data
        .event(EventKind::SendDescriptor)
        .with_message(&header);
    send_data.complete(event);
}

// ============================================================================
// Tests
// ============================================================================
