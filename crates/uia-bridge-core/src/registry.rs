//! Session-scoped element handles.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;
use uia_bridge_common::mutex_lock_or_recover;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Element with id '{id}' was never registered")]
    NotInRegistry { id: String },
    #[error("Element with id '{id}' is no longer cached; find it again")]
    Cleared { id: String },
}

impl RegistryError {
    pub fn id(&self) -> &str {
        match self {
            RegistryError::NotInRegistry { id } | RegistryError::Cleared { id } => id,
        }
    }
}

struct RegistryInner<H> {
    next_id: u64,
    handles: HashMap<u64, H>,
}

/// Maps opaque string ids to platform handles.
///
/// Ids are decimal integers starting at `"1"` and are never reused, not even
/// across [`clear`](ElementRegistry::clear). Handles are not checked for
/// liveness; a dead handle surfaces when the platform call on it fails.
pub struct ElementRegistry<H> {
    inner: Mutex<RegistryInner<H>>,
}

impl<H: Clone> ElementRegistry<H> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 1,
                handles: HashMap::new(),
            }),
        }
    }

    /// Registers `handle` and returns its new id.
    pub fn put(&self, handle: H) -> String {
        let mut inner = mutex_lock_or_recover(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handles.insert(id, handle);
        debug!(id, "registered element");
        id.to_string()
    }

    pub fn get(&self, id: &str) -> Result<H, RegistryError> {
        let inner = mutex_lock_or_recover(&self.inner);
        let key = match id.parse::<u64>() {
            Ok(key) => key,
            Err(_) => return Err(RegistryError::NotInRegistry { id: id.to_string() }),
        };
        match inner.handles.get(&key) {
            Some(handle) => Ok(handle.clone()),
            None if key > 0 && key < inner.next_id => Err(RegistryError::Cleared { id: id.to_string() }),
            None => Err(RegistryError::NotInRegistry { id: id.to_string() }),
        }
    }

    /// Drops every handle and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut inner = mutex_lock_or_recover(&self.inner);
        let dropped = inner.handles.len();
        inner.handles.clear();
        debug!(dropped, "cleared element registry");
        dropped
    }

    pub fn len(&self) -> usize {
        mutex_lock_or_recover(&self.inner).handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone> Default for ElementRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
