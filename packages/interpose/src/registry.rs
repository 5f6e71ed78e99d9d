//! Bookkeeping of which methods are currently intercepted.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::{ERR_POISONED_LOCK, Error, MethodKey, Result};

/// The set of methods that currently have an active interception.
///
/// Membership mirrors the set of live [`Interception`][crate::Interception] handles created
/// through the [`Interceptor`][crate::Interceptor] instances sharing this registry: a key is
/// added when an interception is installed and removed when it is restored.
///
/// There is no process-wide registry. Stacking is refused by the method slots themselves, so a
/// registry only answers which methods its own interceptors hold.
#[derive(Debug, Default)]
pub struct Registry {
    intercepted: Mutex<HashSet<MethodKey>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `method` as intercepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyIntercepted`] if the method is already marked.
    pub fn register(&self, method: MethodKey) -> Result<()> {
        let mut intercepted = self.intercepted.lock().expect(ERR_POISONED_LOCK);

        if !intercepted.insert(method) {
            return Err(Error::AlreadyIntercepted { method });
        }

        Ok(())
    }

    /// Removes the mark from `method`. Does nothing if it was not marked.
    pub fn unregister(&self, method: MethodKey) {
        self.intercepted
            .lock()
            .expect(ERR_POISONED_LOCK)
            .remove(&method);
    }

    /// Whether `method` is currently marked as intercepted.
    #[must_use]
    pub fn is_registered(&self, method: MethodKey) -> bool {
        self.intercepted
            .lock()
            .expect(ERR_POISONED_LOCK)
            .contains(&method)
    }

    /// The number of methods currently marked as intercepted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intercepted.lock().expect(ERR_POISONED_LOCK).len()
    }

    /// Whether no method is currently marked as intercepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intercepted.lock().expect(ERR_POISONED_LOCK).is_empty()
    }
}
