//! The database facade.
//!
//! A concurrent name -> collection map plus the validation the engine
//! front-loads: collection names, nonzero dimensions, and per-vector
//! dimension agreement are all checked here, before anything mutates.

use crate::collection::{Collection, IndexConfig};
use crate::{DbError, Result};
use kombu_vector::{Vector, VectorId, VectorMatch};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum accepted collection name length.
pub const MAX_COLLECTION_NAME_LEN: usize = 128;

/// Name and dimension of a collection, as reported by list/describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub dimension: usize,
}

fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DbError::NameEmpty);
    }
    if name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(DbError::NameTooLong);
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DbError::NameInvalidChars);
    }
    Ok(())
}

/// The top-level engine: every request body resolves its collection here.
///
/// Operations clone the collection's `Arc` out of the name map and release
/// the map lock before doing any real work, so a collection is destroyed
/// only after every in-flight operation observing it has returned.
#[derive(Default)]
pub struct Database {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Database {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        validate_collection_name(name)?;
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::CollectionDoesNotExist(name.to_string()))
    }

    /// Create a collection with a fixed dimension.
    pub fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
        validate_collection_name(name)?;
        if dimension == 0 {
            return Err(DbError::DimensionCantBeZero);
        }

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(DbError::CollectionAlreadyExists(name.to_string()));
        }
        collections.insert(name.to_string(), Arc::new(Collection::new(name, dimension)));
        tracing::info!(collection = name, dimension, "created collection");
        Ok(())
    }

    /// Delete a collection and everything in it.
    pub fn delete_collection(&self, name: &str) -> Result<()> {
        validate_collection_name(name)?;
        let mut collections = self.collections.write();
        if collections.remove(name).is_none() {
            return Err(DbError::CollectionDoesNotExist(name.to_string()));
        }
        tracing::info!(collection = name, "deleted collection");
        Ok(())
    }

    /// Name and dimension of every collection.
    pub fn list_collections(&self) -> Vec<CollectionInfo> {
        self.collections
            .read()
            .values()
            .map(|c| CollectionInfo {
                name: c.name().to_string(),
                dimension: c.dimension(),
            })
            .collect()
    }

    /// Describe a single collection.
    pub fn describe_collection(&self, name: &str) -> Result<CollectionInfo> {
        let collection = self.collection(name)?;
        Ok(CollectionInfo {
            name: collection.name().to_string(),
            dimension: collection.dimension(),
        })
    }

    /// Upsert a batch of vectors into a collection.
    ///
    /// Every vector's dimension is checked against the collection before
    /// anything is written: a mismatch anywhere leaves the batch unapplied.
    pub fn add_vectors(
        &self,
        name: &str,
        vectors: Vec<(VectorId, Vector)>,
    ) -> Result<(usize, usize)> {
        let collection = self.collection(name)?;
        for (_, vector) in &vectors {
            if vector.dimension() != collection.dimension() {
                return Err(DbError::VectorDimensionMismatch {
                    expected: collection.dimension(),
                    actual: vector.dimension(),
                });
            }
        }

        let (added, updated) = collection.add_vectors(vectors);
        tracing::info!(collection = name, added, updated, "upserted vectors");
        Ok((added, updated))
    }

    /// Delete vectors by id, returning how many existed.
    pub fn delete_vectors(&self, name: &str, ids: &[VectorId]) -> Result<usize> {
        let collection = self.collection(name)?;
        let removed = collection.remove_vectors(ids);
        tracing::info!(collection = name, removed, "deleted vectors");
        Ok(removed)
    }

    /// Fetch a copy of one stored vector.
    pub fn get_vector(&self, name: &str, id: VectorId) -> Result<Option<Vector>> {
        Ok(self.collection(name)?.get_vector(id))
    }

    /// Attach an index to a collection. Returns whether it was built.
    pub fn add_index(&self, name: &str, index_name: &str, config: IndexConfig) -> Result<bool> {
        let collection = self.collection(name)?;
        let added = collection.add_index(index_name, config);
        tracing::info!(collection = name, index = index_name, added, "add index");
        Ok(added)
    }

    /// Search a collection for the `k` nearest neighbors of `query`.
    ///
    /// `index_name` selects an attached index; `None` (or an unknown name)
    /// scans the store directly.
    pub fn search(
        &self,
        name: &str,
        query: &Vector,
        k: usize,
        index_name: Option<&str>,
    ) -> Result<Vec<VectorMatch>> {
        let collection = self.collection(name)?;
        if query.dimension() != collection.dimension() {
            return Err(DbError::VectorDimensionMismatch {
                expected: collection.dimension(),
                actual: query.dimension(),
            });
        }

        collection.search_top_k(query, k, index_name).map_err(|e| {
            tracing::error!(collection = name, error = %e, "search failed");
            DbError::Internal(e.to_string())
        })
    }
}
