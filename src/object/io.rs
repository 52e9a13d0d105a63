// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! I/O Port Spaces
//!
//! An `Io` descriptor names a fixed set of x86 I/O ports. Enabling it grants
//! those ports to the calling thread.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::error::{HelError, HelResult};
use crate::sched::Thread;

/// Set of I/O ports
#[derive(Debug)]
pub struct IoSpace {
    ports: Vec<u16>,
}

impl IoSpace {
    /// Create a port space
    ///
    /// Fails with `IllegalArgs` if a port is outside the 16-bit port range.
    pub fn new(ports: &[u32]) -> HelResult<Arc<Self>> {
        let ports = ports
            .iter()
            .map(|&port| u16::try_from(port).map_err(|_| HelError::IllegalArgs))
            .collect::<HelResult<Vec<u16>>>()?;
        Ok(Arc::new(Self { ports }))
    }

    /// Get the ports in this space
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Grant every port of this space to `thread`
    pub fn enable_in_thread(&self, thread: &Thread) {
        for &port in &self.ports {
            thread.enable_io_port(port);
        }
        log::trace!("io: {} ports enabled in thread {}", self.ports.len(), thread.id());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[test]
    fn test_enable_grants_only_listed_ports() {
        let harness = Harness::new();
        let space = IoSpace::new(&[0x60, 0x64]).unwrap();
        assert_eq!(space.ports(), &[0x60, 0x64]);

        space.enable_in_thread(&harness.thread);
        assert!(harness.thread.io_port_enabled(0x60));
        assert!(harness.thread.io_port_enabled(0x64));
        assert!(!harness.thread.io_port_enabled(0x61));
    }

    #[test]
    fn test_port_out_of_range() {
        assert_eq!(IoSpace::new(&[0x1_0000]).err(), Some(HelError::IllegalArgs));
    }
}
