// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Resource Directories
//!
//! A directory maps names to either a mounted subdirectory or a published
//! descriptor. Paths are `/`-separated; the final component `#this` names
//! the directory reached so far.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

use crate::error::{HelError, HelResult};
use crate::object::Descriptor;
use crate::sync::SpinMutex;

/// Path component naming the directory itself
pub const THIS_DIRECTORY: &str = "#this";

/// One directory entry
#[derive(Debug, Clone)]
pub enum RdEntry {
    /// A subdirectory
    Mounted(Arc<RdFolder>),
    /// A descriptor copied in by `publish`
    Published(Descriptor),
}

/// Directory of named capabilities
pub struct RdFolder {
    entries: SpinMutex<BTreeMap<String, RdEntry>>,
}

impl RdFolder {
    /// Create an empty directory
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: SpinMutex::new(BTreeMap::new()),
        })
    }

    /// Mount `folder` under `name`, replacing any previous entry
    pub fn mount(&self, name: &str, folder: Arc<RdFolder>) {
        log::trace!("rd: mount {}", name);
        self.entries
            .lock()
            .insert(name.to_string(), RdEntry::Mounted(folder));
    }

    /// Publish a copy of `descriptor` under `name`, replacing any previous entry
    pub fn publish(&self, name: &str, descriptor: Descriptor) {
        log::trace!("rd: publish {} ({})", name, descriptor.kind().name());
        self.entries
            .lock()
            .insert(name.to_string(), RdEntry::Published(descriptor));
    }

    /// Look up one name
    pub fn get_entry(&self, name: &str) -> Option<RdEntry> {
        self.entries.lock().get(name).cloned()
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the directory is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Resolve `path` relative to this directory
    ///
    /// Every component but the last must name a mounted directory.
    pub fn resolve(self: &Arc<Self>, path: &str) -> HelResult<Descriptor> {
        let mut folder = self.clone();
        let mut components = path.split('/').peekable();

        while let Some(component) = components.next() {
            if components.peek().is_none() {
                if component == THIS_DIRECTORY {
                    return Ok(Descriptor::Directory(folder));
                }
                return match folder.get_entry(component) {
                    Some(RdEntry::Published(descriptor)) => Ok(descriptor),
                    Some(RdEntry::Mounted(subfolder)) => Ok(Descriptor::Directory(subfolder)),
                    None => Err(HelError::NoSuchPath),
                };
            }
            folder = match folder.get_entry(component) {
                Some(RdEntry::Mounted(subfolder)) => subfolder,
                _ => return Err(HelError::NoSuchPath),
            };
        }
        Err(HelError::NoSuchPath)
    }
}

impl fmt::Debug for RdFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RdFolder").field("entries", &self.len()).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::EventHub;

    #[test]
    fn test_resolve_paths() {
        let root = RdFolder::new();
        let dev = RdFolder::new();
        let hub = EventHub::new();
        dev.publish("hub", Descriptor::EventHub(hub.clone()));
        root.mount("dev", dev.clone());

        let found = root.resolve("dev/hub").unwrap();
        assert!(Arc::ptr_eq(found.as_event_hub().unwrap(), &hub));

        let this = root.resolve("dev/#this").unwrap();
        assert!(Arc::ptr_eq(this.as_directory().unwrap(), &dev));
        let itself = root.resolve("#this").unwrap();
        assert!(Arc::ptr_eq(itself.as_directory().unwrap(), &root));
    }

    #[test]
    fn test_missing_components() {
        let root = RdFolder::new();
        root.publish("file", Descriptor::EventHub(EventHub::new()));

        assert_eq!(root.resolve("nope").err(), Some(HelError::NoSuchPath));
        assert_eq!(root.resolve("nope/file").err(), Some(HelError::NoSuchPath));
        // A published entry is not a directory
        assert_eq!(root.resolve("file/x").err(), Some(HelError::NoSuchPath));
    }

    #[test]
    fn test_publish_replaces() {
        let root = RdFolder::new();
        root.publish("x", Descriptor::EventHub(EventHub::new()));
        root.mount("x", RdFolder::new());
        assert_eq!(root.len(), 1);
        assert!(matches!(root.get_entry("x"), Some(RdEntry::Mounted(_))));
    }
}
