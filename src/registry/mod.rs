//! Registry of command names that require step-up authentication.

pub mod store;

pub use store::{FilterStore, JsonFileStore, MemoryStore};

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError, RwLock};

use log::{debug, warn};

use crate::error::StoreError;

/// The set of filtered command names, backed by a [`FilterStore`].
///
/// Mutations run as a single critical section: re-read the persisted set,
/// mutate it, write it back, then publish it to the in-memory snapshot that
/// [`contains`](Self::contains) reads. Concurrent `add`/`remove` calls
/// serialize on `txn` and never lose an update.
pub struct FilterRegistry {
    store: Box<dyn FilterStore>,
    txn: Mutex<()>,
    snapshot: RwLock<HashSet<String>>,
}

impl FilterRegistry {
    /// Open the registry, loading the persisted set.
    pub fn open(store: Box<dyn FilterStore>) -> Result<Self, StoreError> {
        let initial = store.load()?;
        debug!("filter registry loaded with {} command(s)", initial.len());
        Ok(Self {
            store,
            txn: Mutex::new(()),
            snapshot: RwLock::new(initial),
        })
    }

    /// Read, mutate, and write back the persisted set under the registry lock.
    fn transaction<R>(&self, mutate: impl FnOnce(&mut HashSet<String>) -> R) -> Result<R, StoreError> {
        let _guard = self.txn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut commands = self.store.load()?;
        let result = mutate(&mut commands);
        self.store.save(&commands)?;
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = commands;
        Ok(result)
    }

    /// Add `name`. Returns `false` if it was already filtered.
    pub fn add(&self, name: &str) -> Result<bool, StoreError> {
        debug!("add_command {name}");
        self.transaction(|cmds| cmds.insert(name.to_string()))
    }

    /// Remove `name`. Returns `false` (and logs) if it was not filtered.
    pub fn remove(&self, name: &str) -> Result<bool, StoreError> {
        debug!("remove_command {name}");
        let removed = self.transaction(|cmds| cmds.remove(name))?;
        if !removed {
            warn!("remove_command: {name} was not in the filtered command set");
        }
        Ok(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    /// All filtered command names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
