//! Core vector abstractions for KombuDB.
//!
//! This crate provides the building blocks shared by every index type:
//!
//! - **Vector values**: fixed-dimension f32 payloads with optional metadata
//! - **Distance kernels**: Euclidean (L2), Cosine, Inner Product
//! - **VectorStore**: the concurrent id -> vector map owned by a collection
//! - **Index trait**: common interface for vector indexes
//! - **BruteForceIndex**: linear scan search (the fallback path)
//!
//! # Architecture
//!
//! A collection owns its vectors through an `Arc<VectorStore>`; index
//! instances observe the same store through a `Weak` handle and are notified
//! of id-set deltas after every mutation:
//!
//! ```text
//! Collection ──owns──> Arc<VectorStore> <──observes(Weak)── BruteForceIndex
//!      │                                 <──observes(Weak)── HnswIndex (kombu-hnsw)
//!      └──notifies──> Index::on_add / Index::on_remove
//! ```
//!
//! Dropping the collection invalidates every index attached to it; an index
//! that loses its store answers queries with [`VectorError::StoreGone`]
//! instead of crashing.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kombu_vector::{BruteForceIndex, Distance, Index, Vector, VectorStore};
//!
//! let store = Arc::new(VectorStore::new());
//! store.upsert(vec![
//!     (1, Vector::new(vec![0.0, 0.0])),
//!     (2, Vector::new(vec![3.0, 4.0])),
//! ]);
//!
//! let index = BruteForceIndex::new(Arc::downgrade(&store), Distance::Euclidean);
//! let hits = index.search_top_k(&Vector::new(vec![0.0, 0.0]), 1).unwrap();
//! assert_eq!(hits[0].id, 1);
//! ```

mod brute;
mod distance;
mod store;
mod traits;
mod vector;

pub use brute::BruteForceIndex;
pub use distance::{cosine_distance, euclidean_distance, inner_product, Distance};
pub use store::VectorStore;
pub use traits::{Index, IndexKind, VectorMatch};
pub use vector::{Vector, VectorId};

/// Error type for vector operations.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector store no longer exists")]
    StoreGone,

    #[error("vector not found: {0}")]
    NotFound(VectorId),

    #[error("index error: {0}")]
    IndexError(String),
}

/// Result type for vector operations.
pub type Result<T> = std::result::Result<T, VectorError>;
