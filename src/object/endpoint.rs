// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Bidirectional Endpoints
//!
//! A full pipe is two channels. Each of its two endpoints writes into one
//! channel and reads from the other, so a message sent on one endpoint is
//! received on its peer.
//!
//! # Design
//!
//! - **Side `i`** writes channel `i` and reads channel `1 - i`
//! - **Close on drop**: when the last reference to an endpoint goes away its
//!   write channel loses the writer and its read channel loses the reader;
//!   the peer sees `ClosedRemotely` from then on
//!
//! # Usage
//!
//! ```ignore
//! let (a, b) = Endpoint::create_pair();
//! a.write_channel().send(send)?;
//! b.read_channel().submit_recv(recv)?;
//! ```

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::object::{Channel, ChannelSide};

/// Two channels, one per direction
#[derive(Debug)]
pub struct FullPipe {
    channels: [Channel; 2],
}

impl FullPipe {
    fn new() -> Self {
        Self {
            channels: [Channel::new(), Channel::new()],
        }
    }

    /// Get one of the two channels
    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index]
    }
}

/// One end of a full pipe
pub struct Endpoint {
    pipe: Arc<FullPipe>,
    side: usize,
    closed: AtomicBool,
}

impl Endpoint {
    /// Create a connected pair of endpoints
    pub fn create_pair() -> (Arc<Endpoint>, Arc<Endpoint>) {
        let pipe = Arc::new(FullPipe::new());
        let first = Arc::new(Self {
            pipe: pipe.clone(),
            side: 0,
            closed: AtomicBool::new(false),
        });
        let second = Arc::new(Self {
            pipe,
            side: 1,
            closed: AtomicBool::new(false),
        });
        (first, second)
    }

    /// Get the pipe side of this endpoint (0 or 1)
    pub fn side(&self) -> usize {
        self.side
    }

    /// Channel carrying messages sent on this endpoint
    pub fn write_channel(&self) -> &Channel {
        self.pipe.channel(self.side)
    }

    /// Channel carrying messages sent by the peer
    pub fn read_channel(&self) -> &Channel {
        self.pipe.channel(1 - self.side)
    }

    /// Check whether `other` is the peer of this endpoint
    pub fn is_peer_of(&self, other: &Endpoint) -> bool {
        Arc::ptr_eq(&self.pipe, &other.pipe) && self.side != other.side
    }

    /// Close both directions from this end
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        log::trace!("endpoint: closing side {}", self.side);
        self.write_channel().close(ChannelSide::Writer);
        self.read_channel().close(ChannelSide::Reader);
    }

    /// Check whether this end was closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("side", &self.side)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
