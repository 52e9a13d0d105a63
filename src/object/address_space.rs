// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Address Spaces
//!
//! Page tables live outside the message core. An address space here is only
//! an identity that threads run in and that the executor switches to.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

/// Address space identifier
pub type SpaceId = u64;

fn alloc_space_id() -> SpaceId {
    static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(1);

    NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Address space
#[derive(Debug)]
pub struct AddressSpace {
    id: SpaceId,
}

impl AddressSpace {
    /// Create a new, empty address space
    pub fn new() -> Arc<Self> {
        let space = Arc::new(Self { id: alloc_space_id() });
        log::debug!("space {}: created", space.id);
        space
    }

    /// Get the address space ID
    pub fn id(&self) -> SpaceId {
        self.id
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique() {
        assert_ne!(AddressSpace::new().id(), AddressSpace::new().id());
    }
}
