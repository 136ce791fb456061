//! Concurrent vector storage.

use crate::vector::{Vector, VectorId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// The id -> vector map at the heart of a collection.
///
/// A collection owns its store through an `Arc`; indexes observe it through
/// a `Weak` handle so that dropping the collection invalidates them without
/// a reference cycle. All access goes through this type's reader-writer
/// lock, which is independent of the locks guarding index registration and
/// index internals.
#[derive(Debug, Default)]
pub struct VectorStore {
    vectors: RwLock<HashMap<VectorId, Vector>>,
}

impl VectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a batch of vectors under a single writer lock.
    ///
    /// Returns `(added, updated)` counts. Dimension agreement is the
    /// caller's responsibility; the facade validates before calling in.
    pub fn upsert(&self, batch: Vec<(VectorId, Vector)>) -> (usize, usize) {
        let mut vectors = self.vectors.write();
        let mut added = 0;
        let mut updated = 0;
        for (id, vector) in batch {
            if vectors.insert(id, vector).is_some() {
                updated += 1;
            } else {
                added += 1;
            }
        }
        (added, updated)
    }

    /// Remove the given ids, returning the ones that were present.
    pub fn remove(&self, ids: &[VectorId]) -> Vec<VectorId> {
        let mut vectors = self.vectors.write();
        ids.iter()
            .copied()
            .filter(|id| vectors.remove(id).is_some())
            .collect()
    }

    /// Fetch a copy of a vector.
    pub fn get(&self, id: VectorId) -> Option<Vector> {
        self.vectors.read().get(&id).cloned()
    }

    /// Snapshot the current id set.
    pub fn ids(&self) -> HashSet<VectorId> {
        self.vectors.read().keys().copied().collect()
    }

    /// Run `f` against the map under the reader lock.
    ///
    /// This is the scan primitive for index implementations that need to
    /// visit many vectors without cloning each one.
    pub fn with_vectors<R>(&self, f: impl FnOnce(&HashMap<VectorId, Vector>) -> R) -> R {
        f(&self.vectors.read())
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.read().len()
    }

    /// Whether the store holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
