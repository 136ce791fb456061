//! Brute force vector index.
//!
//! Linear scan over the collection's store - O(n * d) per query, but exact,
//! allocation-light, and always available. Collections fall back to it when
//! a search names no index, and tests use it as the correctness oracle for
//! the graph indexes.

use crate::distance::Distance;
use crate::store::VectorStore;
use crate::traits::{Index, IndexKind, VectorMatch};
use crate::vector::{Vector, VectorId};
use crate::{Result, VectorError};
use std::sync::Weak;

/// Stateless linear-scan index.
///
/// Holds no data of its own: every query walks the observed store under its
/// reader lock, computes all distances, and partially sorts out the top `k`.
pub struct BruteForceIndex {
    store: Weak<VectorStore>,
    distance: Distance,
}

impl BruteForceIndex {
    /// Create a brute-force index over a store handle.
    pub fn new(store: Weak<VectorStore>, distance: Distance) -> Self {
        Self { store, distance }
    }

    /// The distance function used by this index.
    pub fn distance_function(&self) -> Distance {
        self.distance
    }
}

impl Index for BruteForceIndex {
    fn search_top_k(&self, query: &Vector, k: usize) -> Result<Vec<VectorMatch>> {
        let store = self.store.upgrade().ok_or(VectorError::StoreGone)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        // Scan, partial-sort, and copy the winners under one reader lock so
        // the result is a consistent snapshot.
        let matches = store.with_vectors(|vectors| {
            let mut scored: Vec<(f64, VectorId)> = vectors
                .iter()
                .map(|(&id, v)| (self.distance.distance(query.as_slice(), v.as_slice()), id))
                .collect();

            let k = k.min(scored.len());
            let cmp = |a: &(f64, VectorId), b: &(f64, VectorId)| {
                a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
            };
            if k > 0 && k < scored.len() {
                scored.select_nth_unstable_by(k - 1, cmp);
                scored.truncate(k);
            }
            scored.sort_unstable_by(cmp);

            scored
                .into_iter()
                .map(|(distance, id)| {
                    VectorMatch::with_vector(id, distance, vectors[&id].clone())
                })
                .collect::<Vec<_>>()
        });

        Ok(matches)
    }

    fn kind(&self) -> IndexKind {
        IndexKind::BruteForce
    }
}
