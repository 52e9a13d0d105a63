// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Message passing calls
//!
//! Sends and receives name an endpoint in one of three ways: an endpoint
//! descriptor, a universe descriptor (the superior end of that universe's
//! channel) or `THIS_UNIVERSE` (the inferior end of the caller's own).

use alloc::sync::Arc;

use super::Hel;
use crate::error::{HelError, HelResult};
use crate::object::{
    AsyncAccept, AsyncConnect, AsyncRecv, AsyncRecvDescriptor, AsyncRecvString,
    AsyncRingItem, AsyncSend, AsyncSendDescriptor, AsyncSendString, Descriptor, Endpoint,
    Handle, MsgFlags, MsgHeader, RecvFilter, RecvTarget, SubmitInfo,
};

impl<'k> Hel<'k> {
    /// Resolve the endpoint a send or receive goes through
    fn endpoint(&self, handle: Handle) -> HelResult<Arc<Endpoint>> {
        if handle == Handle::THIS_UNIVERSE {
            return Ok(self.universe().inferior_endpoint().clone());
        }
        self.universe().with_descriptor(handle, |d| match d {
            Descriptor::Endpoint(endpoint) => Ok(endpoint.clone()),
            Descriptor::Universe(universe) => Ok(universe.superior_endpoint().clone()),
            _ => Err(HelError::BadDescriptor),
        })
    }

    /// Send a copy of `bytes`
    #[allow(clippy::too_many_arguments)]
    pub fn submit_send_string(
        &self,
        endpoint: Handle,
        hub: Handle,
        bytes: &[u8],
        request: i64,
        sequence: i64,
        flags: u32,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        let flags = MsgFlags::from_user(flags)?;
        if bytes.len() > self.kernel.config().max_string_payload {
            return Err(HelError::IllegalArgs);
        }
        let endpoint = self.endpoint(endpoint)?;
        let (async_id, data) = self.async_data(hub, submit)?;

        endpoint.write_channel().send(AsyncSend::String(AsyncSendString {
            data,
            header: MsgHeader::new(flags, request, sequence),
            buffer: bytes.to_vec(),
        }))?;
        Ok(async_id)
    }

    /// Send a copy of the descriptor behind `descriptor`
    #[allow(clippy::too_many_arguments)]
    pub fn submit_send_descriptor(
        &self,
        endpoint: Handle,
        hub: Handle,
        descriptor: Handle,
        request: i64,
        sequence: i64,
        flags: u32,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        let flags = MsgFlags::from_user(flags)?;
        let endpoint = self.endpoint(endpoint)?;
        let descriptor = self.descriptor(descriptor)?;
        let (async_id, data) = self.async_data(hub, submit)?;

        endpoint
            .write_channel()
            .send(AsyncSend::Descriptor(AsyncSendDescriptor {
                data,
                header: MsgHeader::new(flags, request, sequence),
                descriptor,
            }))?;
        Ok(async_id)
    }

    /// Receive a string of at most `max_length` bytes
    #[allow(clippy::too_many_arguments)]
    pub fn submit_recv_string(
        &self,
        endpoint: Handle,
        hub: Handle,
        max_length: usize,
        request: i64,
        sequence: i64,
        flags: u32,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        let flags = MsgFlags::from_user(flags)?;
        let endpoint = self.endpoint(endpoint)?;
        let (async_id, data) = self.async_data(hub, submit)?;

        endpoint
            .read_channel()
            .submit_recv(AsyncRecv::String(AsyncRecvString {
                data,
                filter: RecvFilter::new(flags, request, sequence),
                target: RecvTarget::Buffer { max_length },
            }))?;
        Ok(async_id)
    }

    /// Receive a string into the front buffer of a ring
    #[allow(clippy::too_many_arguments)]
    pub fn submit_recv_string_to_ring(
        &self,
        endpoint: Handle,
        hub: Handle,
        ring: Handle,
        request: i64,
        sequence: i64,
        flags: u32,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        let flags = MsgFlags::from_user(flags)?;
        let endpoint = self.endpoint(endpoint)?;
        let ring = self
            .universe()
            .with_descriptor(ring, |d| d.as_ring().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;

        endpoint
            .read_channel()
            .submit_recv(AsyncRecv::String(AsyncRecvString {
                data,
                filter: RecvFilter::new(flags, request, sequence),
                target: RecvTarget::Ring(ring),
            }))?;
        Ok(async_id)
    }

    /// Receive a descriptor into the caller's capability space
    pub fn submit_recv_descriptor(
        &self,
        endpoint: Handle,
        hub: Handle,
        request: i64,
        sequence: i64,
        flags: u32,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        let flags = MsgFlags::from_user(flags)?;
        let endpoint = self.endpoint(endpoint)?;
        let (async_id, data) = self.async_data(hub, submit)?;

        endpoint
            .read_channel()
            .submit_recv(AsyncRecv::Descriptor(AsyncRecvDescriptor {
                data,
                filter: RecvFilter::new(flags, request, sequence),
                universe: Arc::downgrade(self.universe()),
            }))?;
        Ok(async_id)
    }

    /// Wait for a client on a server handle
    pub fn submit_accept(&self, server: Handle, hub: Handle, submit: SubmitInfo) -> HelResult<i64> {
        let server = self
            .universe()
            .with_descriptor(server, |d| d.as_server().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;

        server.submit_accept(AsyncAccept {
            data,
            universe: Arc::downgrade(self.universe()),
        });
        Ok(async_id)
    }

    /// Connect through a client handle
    pub fn submit_connect(&self, client: Handle, hub: Handle, submit: SubmitInfo) -> HelResult<i64> {
        let server = self
            .universe()
            .with_descriptor(client, |d| d.as_client().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;

        server.submit_connect(AsyncConnect {
            data,
            universe: Arc::downgrade(self.universe()),
        });
        Ok(async_id)
    }

    /// Hand a buffer of `size` bytes to a ring
    pub fn submit_ring(
        &self,
        ring: Handle,
        hub: Handle,
        size: usize,
        submit: SubmitInfo,
    ) -> HelResult<i64> {
        if size == 0 || size > self.kernel.config().max_string_payload {
            return Err(HelError::IllegalArgs);
        }
        let ring = self
            .universe()
            .with_descriptor(ring, |d| d.as_ring().cloned())?;
        let (async_id, data) = self.async_data(hub, submit)?;

        ring.submit_buffer(AsyncRingItem::new(data, size));
        Ok(async_id)
    }
}

// ============================================================================
// Tests
// ============================================================================
