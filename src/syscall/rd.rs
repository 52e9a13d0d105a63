// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Resource directory calls

use super::Hel;
use crate::error::HelResult;
use crate::object::{Descriptor, Handle, RdFolder};

impl<'k> Hel<'k> {
    /// Create an empty directory
    pub fn create_directory(&self) -> Handle {
        self.universe().attach(Descriptor::Directory(RdFolder::new()))
    }

    /// Mount `subdirectory` under `name` in `directory`
    pub fn mount(&self, directory: Handle, name: &str, subdirectory: Handle) -> HelResult<()> {
        let directory = self
            .universe()
            .with_descriptor(directory, |d| d.as_directory().cloned())?;
        let subdirectory = self
            .universe()
            .with_descriptor(subdirectory, |d| d.as_directory().cloned())?;
        directory.mount(name, subdirectory);
        Ok(())
    }

    /// Publish the object behind `handle` under `name` in `directory`
    pub fn publish(&self, directory: Handle, name: &str, handle: Handle) -> HelResult<()> {
        let directory = self
            .universe()
            .with_descriptor(directory, |d| d.as_directory().cloned())?;
        let descriptor = self.universe().get(handle)?;
        directory.publish(name, descriptor);
        Ok(())
    }

    /// Resolve `path` in the calling thread's directory
    ///
    /// The object found is attached to the caller's capability space.
    pub fn open(&self, path: &str) -> HelResult<Handle> {
        let descriptor = self.thread.directory().resolve(path)?;
        Ok(self.universe().attach(descriptor))
    }
}

// ============================================================================
// Tests
// ============================================================================
