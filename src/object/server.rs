// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Servers
//!
//! A server pairs up accept and connect requests. Every matched pair gets a
//! fresh full pipe: the accepting side receives one endpoint, the connecting
//! side the other.
//!
//! # Design
//!
//! - **FIFO pairing**: the oldest pending accept is paired with the oldest
//!   pending connect
//! - **Unlocked completion**: the pipe is created and both handles are
//!   attached after the server lock is dropped

use alloc::collections::VecDeque;
use alloc::sync::{Arc, Weak};
use core::fmt;

use crate::error::HelError;
use crate::object::{AsyncAccept, AsyncConnect, AsyncData, Descriptor, Endpoint, EventKind, Handle, Universe};
use crate::sync::SpinMutex;

struct ServerInner {
    accepts: VecDeque<AsyncAccept>,
    connects: VecDeque<AsyncConnect>,
}

/// Rendezvous point for accept and connect requests
pub struct Server {
    inner: SpinMutex<ServerInner>,
}

impl Server {
    /// Create a new server
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SpinMutex::new(ServerInner {
                accepts: VecDeque::new(),
                connects: VecDeque::new(),
            }),
        })
    }

    /// Queue an accept, pairing it with a pending connect if there is one
    pub fn submit_accept(&self, accept: AsyncAccept) {
        let connect = {
            let mut inner = self.inner.lock();
            match inner.connects.pop_front() {
                Some(connect) => connect,
                None => {
                    inner.accepts.push_back(accept);
                    return;
                }
            }
        };
        establish(accept, connect);
    }

    /// Queue a connect, pairing it with a pending accept if there is one
    pub fn submit_connect(&self, connect: AsyncConnect) {
        let accept = {
            let mut inner = self.inner.lock();
            match inner.accepts.pop_front() {
                Some(accept) => accept,
                None => {
                    inner.connects.push_back(connect);
                    return;
                }
            }
        };
        establish(accept, connect);
    }

    /// Get the number of pending accepts
    pub fn pending_accepts(&self) -> usize {
        self.inner.lock().accepts.len()
    }

    /// Get the number of pending connects
    pub fn pending_connects(&self) -> usize {
        self.inner.lock().connects.len()
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("accepts", &self.pending_accepts())
            .field("connects", &self.pending_connects())
            .finish()
    }
}

/// Connect a matched pair through a new pipe
fn establish(accept: AsyncAccept, connect: AsyncConnect) {
    let (server_end, client_end) = Endpoint::create_pair();
    log::trace!(
        "server: pairing accept {} with connect {}",
        accept.data.async_id(),
        connect.data.async_id()
    );
    deliver(accept.data, &accept.universe, EventKind::Accept, server_end);
    deliver(connect.data, &connect.universe, EventKind::Connect, client_end);
}

fn deliver(data: AsyncData, universe: &Weak<Universe>, kind: EventKind, endpoint: Arc<Endpoint>) {
    let mut event = data.event(kind);
    match universe.upgrade() {
        Some(universe) => event.handle = universe.attach(Descriptor::Endpoint(endpoint)),
        None => {
            log::warn!("server: {:?} target universe destroyed", kind);
            event.handle = Handle::NULL;
            event.error = Some(HelError::ClosedLocally);
        }
    }
    data.complete(event);
}

// ============================================================================
// Tests
// ============================================================================
