//! Collections: a vector store plus its attached indexes.

use kombu_hnsw::{HnswIndex, HnswParams};
use kombu_vector::{
    BruteForceIndex, Distance, Index, IndexKind, Vector, VectorId, VectorMatch, VectorStore,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Configuration for an index being attached to a collection.
#[derive(Debug, Clone)]
pub enum IndexConfig {
    /// Linear scan with an explicit distance function.
    BruteForce { distance: Distance },
    /// HNSW graph with full tuning parameters.
    Hnsw(HnswParams),
    /// Recognized but not buildable; registration answers `false`.
    IvfFlat,
}

impl IndexConfig {
    /// The kind of index this configuration produces.
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::BruteForce { .. } => IndexKind::BruteForce,
            Self::Hnsw(_) => IndexKind::Hnsw,
            Self::IvfFlat => IndexKind::IvfFlat,
        }
    }
}

/// A named container of vectors sharing one fixed dimension.
///
/// The store and the index registry have independent reader-writer locks;
/// when both are held the registry lock is taken first. Store mutations
/// commit before any index hears about them, and notifications go out under
/// the registry's reader lock so registration cannot race a delta.
pub struct Collection {
    name: String,
    dimension: usize,
    store: Arc<VectorStore>,
    indexes: RwLock<HashMap<String, Arc<dyn Index>>>,
}

impl Collection {
    pub(crate) fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            store: Arc::new(VectorStore::new()),
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// The collection's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dimension every stored vector must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the collection holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Insert or overwrite a batch of vectors.
    ///
    /// Returns `(added, updated)`. The whole batch commits under one store
    /// writer lock; afterwards every attached index is told the full id
    /// delta. Dimensions were validated by the facade.
    pub fn add_vectors(&self, batch: Vec<(VectorId, Vector)>) -> (usize, usize) {
        let ids: Vec<VectorId> = batch.iter().map(|(id, _)| *id).collect();
        let counts = self.store.upsert(batch);

        let indexes = self.indexes.read();
        for index in indexes.values() {
            index.on_add(&ids);
        }
        counts
    }

    /// Remove vectors by id, returning how many existed.
    pub fn remove_vectors(&self, ids: &[VectorId]) -> usize {
        let removed = self.store.remove(ids);
        if !removed.is_empty() {
            let indexes = self.indexes.read();
            for index in indexes.values() {
                index.on_remove(&removed);
            }
        }
        removed.len()
    }

    /// Fetch a copy of a stored vector.
    pub fn get_vector(&self, id: VectorId) -> Option<Vector> {
        self.store.get(id)
    }

    /// Snapshot the stored id set.
    pub fn snapshot_ids(&self) -> HashSet<VectorId> {
        self.store.ids()
    }

    /// Attach a new index under `name`.
    ///
    /// The index is built from the store's current contents before it
    /// becomes visible to searches. Returns `false` for kinds without a
    /// construction path, for duplicate names, and for indexes that fail to
    /// build; registration never propagates an error.
    pub fn add_index(&self, name: &str, config: IndexConfig) -> bool {
        let mut indexes = self.indexes.write();
        if indexes.contains_key(name) {
            return false;
        }

        let index: Arc<dyn Index> = match config {
            IndexConfig::BruteForce { distance } => {
                Arc::new(BruteForceIndex::new(Arc::downgrade(&self.store), distance))
            }
            IndexConfig::Hnsw(params) => {
                if params.m < 2 {
                    tracing::error!(
                        collection = %self.name,
                        index = name,
                        m = params.m,
                        "rejecting hnsw index: m must be at least 2"
                    );
                    return false;
                }
                Arc::new(HnswIndex::new(Arc::downgrade(&self.store), params))
            }
            IndexConfig::IvfFlat => return false,
        };

        if let Err(e) = index.initialize() {
            tracing::error!(
                collection = %self.name,
                index = name,
                error = %e,
                "index initialization failed"
            );
            return false;
        }

        indexes.insert(name.to_string(), index);
        true
    }

    /// Names of the attached indexes.
    pub fn index_names(&self) -> Vec<String> {
        self.indexes.read().keys().cloned().collect()
    }

    /// Search for the `k` nearest neighbors.
    ///
    /// Resolves `index_name` against the registry; an unnamed or unknown
    /// index falls back to a Euclidean linear scan over the store.
    pub fn search_top_k(
        &self,
        query: &Vector,
        k: usize,
        index_name: Option<&str>,
    ) -> kombu_vector::Result<Vec<VectorMatch>> {
        let indexes = self.indexes.read();
        match index_name.and_then(|name| indexes.get(name)) {
            Some(index) => index.search_top_k(query, k),
            None => BruteForceIndex::new(Arc::downgrade(&self.store), Distance::Euclidean)
                .search_top_k(query, k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_with(vectors: Vec<(VectorId, Vec<f32>)>, dimension: usize) -> Collection {
        let collection = Collection::new("test", dimension);
        collection.add_vectors(
            vectors
                .into_iter()
                .map(|(id, data)| (id, Vector::new(data)))
                .collect(),
        );
        collection
    }

    #[test]
    fn test_add_and_remove_counts() {
        let collection = Collection::new("test", 2);

        let (added, updated) = collection.add_vectors(vec![
            (1, Vector::new(vec![0.0, 0.0])),
            (2, Vector::new(vec![1.0, 0.0])),
        ]);
        assert_eq!((added, updated), (2, 0));

        let (added, updated) = collection.add_vectors(vec![(2, Vector::new(vec![2.0, 0.0]))]);
        assert_eq!((added, updated), (0, 1));

        assert_eq!(collection.remove_vectors(&[1, 99]), 1);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_fallback_search_without_index() {
        let collection = collection_with(
            vec![(1, vec![0.0, 0.0]), (2, vec![1.0, 0.0]), (3, vec![5.0, 0.0])],
            2,
        );

        let hits = collection
            .search_top_k(&Vector::new(vec![0.0, 0.0]), 2, None)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 2);
    }

    #[test]
    fn test_unknown_index_name_falls_back() {
        let collection = collection_with(vec![(1, vec![0.0, 0.0]), (2, vec![3.0, 4.0])], 2);
        let hits = collection
            .search_top_k(&Vector::new(vec![0.0, 0.0]), 1, Some("nope"))
            .unwrap();
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn test_add_index_builds_from_existing_vectors() {
        let collection = collection_with(
            (0..20).map(|i| (i, vec![i as f32, 0.0])).collect(),
            2,
        );

        assert!(collection.add_index(
            "ann",
            IndexConfig::Hnsw(HnswParams {
                distance: Distance::Euclidean,
                m: 4,
                ef_construction: 32,
                ef_search: 32,
            }),
        ));

        let hits = collection
            .search_top_k(&Vector::new(vec![7.1, 0.0]), 3, Some("ann"))
            .unwrap();
        assert_eq!(hits[0].id, 7);
    }

    #[test]
    fn test_add_index_rejects_duplicates_and_stubs() {
        let collection = Collection::new("test", 2);
        assert!(collection.add_index("a", IndexConfig::BruteForce { distance: Distance::Cosine }));
        assert!(!collection.add_index("a", IndexConfig::BruteForce { distance: Distance::Cosine }));
        assert!(!collection.add_index("ivf", IndexConfig::IvfFlat));
        assert!(!collection.add_index(
            "tiny_m",
            IndexConfig::Hnsw(HnswParams {
                m: 1,
                ..HnswParams::default()
            }),
        ));
        assert_eq!(collection.index_names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_indexes_track_mutations() {
        let collection = collection_with(
            (0..10).map(|i| (i, vec![i as f32, 0.0])).collect(),
            2,
        );
        collection.add_index(
            "ann",
            IndexConfig::Hnsw(HnswParams {
                distance: Distance::Euclidean,
                m: 4,
                ef_construction: 32,
                ef_search: 32,
            }),
        );

        collection.remove_vectors(&[0]);
        collection.add_vectors(vec![(42, Vector::new(vec![0.1, 0.0]))]);

        let hits = collection
            .search_top_k(&Vector::new(vec![0.0, 0.0]), 2, Some("ann"))
            .unwrap();
        let ids: Vec<VectorId> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![42, 1]);
    }

    #[test]
    fn test_snapshot_ids() {
        let collection = collection_with(vec![(7, vec![0.0]), (8, vec![1.0])], 1);
        let ids = collection.snapshot_ids();
        assert!(ids.contains(&7) && ids.contains(&8));
        assert_eq!(ids.len(), 2);
    }
}
