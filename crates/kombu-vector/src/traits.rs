//! The index contract.
//!
//! Every index type implements [`Index`] so collections can treat them
//! interchangeably: a polymorphic search surface plus delta notifications
//! that let an index absorb store mutations on its own schedule.

use crate::vector::{Vector, VectorId};
use crate::Result;

/// A match returned from vector search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    /// The vector id.
    pub id: VectorId,
    /// Distance to the query (lower = more similar).
    pub distance: f64,
    /// A copy of the stored vector, when the search attaches payloads.
    pub vector: Option<Vector>,
}

impl VectorMatch {
    /// Create a match without payload.
    pub fn new(id: VectorId, distance: f64) -> Self {
        Self {
            id,
            distance,
            vector: None,
        }
    }

    /// Create a match carrying the stored vector.
    pub fn with_vector(id: VectorId, distance: f64, vector: Vector) -> Self {
        Self {
            id,
            distance,
            vector: Some(vector),
        }
    }
}

impl Eq for VectorMatch {}

impl PartialOrd for VectorMatch {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VectorMatch {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Distance first (total_cmp handles NaN), id breaks ties
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// Index variants the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Linear scan over the whole store.
    BruteForce,
    /// Hierarchical Navigable Small World graph.
    Hnsw,
    /// Inverted-file flat index. Recognized on the wire surface but has no
    /// construction path yet; registration answers `false`.
    IvfFlat,
}

/// Common interface for vector indexes.
///
/// Implementations must be `Send + Sync`; internal synchronization is each
/// index's own business. Indexes never own vectors: they observe their
/// collection's store through a `Weak` handle, so every method must tolerate
/// the store disappearing mid-call and answer with [`crate::VectorError::StoreGone`]
/// rather than panicking.
pub trait Index: Send + Sync {
    /// Build the index from the store's current contents.
    ///
    /// Called once by the collection before the index is published.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Search for the `k` nearest neighbors to the query vector.
    ///
    /// Returns up to `k` matches sorted by ascending distance, with a copy
    /// of each stored vector attached.
    fn search_top_k(&self, query: &Vector, k: usize) -> Result<Vec<VectorMatch>>;

    /// Notification: the given ids were inserted or overwritten in the store.
    fn on_add(&self, _ids: &[VectorId]) {}

    /// Notification: the given ids were removed from the store.
    fn on_remove(&self, _ids: &[VectorId]) {}

    /// Which variant this index is.
    fn kind(&self) -> IndexKind;
}
