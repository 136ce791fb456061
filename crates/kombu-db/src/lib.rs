//! KombuDB: an in-memory vector database.
//!
//! Named collections of fixed-dimension f32 vectors with upsert, deletion,
//! and approximate k-nearest-neighbor search. This crate ties the engine
//! together:
//!
//! - **Collection**: a vector store plus the indexes attached to it,
//!   wired so every store mutation notifies every index of the id delta
//! - **Database**: the name-validated facade the outside world talks to
//! - **WorkerPool**: a bounded executor that runs request bodies on a
//!   fixed set of worker threads
//!
//! # Example
//!
//! ```
//! use kombu_db::{Database, IndexConfig};
//! use kombu_hnsw::HnswParams;
//! use kombu_vector::{Distance, Vector};
//!
//! let db = Database::new();
//! db.create_collection("embeddings", 2).unwrap();
//! db.add_vectors("embeddings", vec![
//!     (1, Vector::new(vec![0.0, 0.0])),
//!     (2, Vector::new(vec![1.0, 0.0])),
//! ]).unwrap();
//!
//! db.add_index("embeddings", "ann", IndexConfig::Hnsw(HnswParams {
//!     distance: Distance::Euclidean,
//!     ..HnswParams::default()
//! })).unwrap();
//!
//! let hits = db.search("embeddings", &Vector::new(vec![0.1, 0.1]), 1, Some("ann")).unwrap();
//! assert_eq!(hits[0].id, 1);
//! ```

mod collection;
mod database;
mod executor;

pub use collection::{Collection, IndexConfig};
pub use database::{CollectionInfo, Database, MAX_COLLECTION_NAME_LEN};
pub use executor::{ExecutorError, WorkerPool, DEFAULT_QUEUE_CAPACITY};

/// The error taxonomy exposed by the database facade.
///
/// Validation failures are front-loaded at the facade; anything an index or
/// store reports past its own surface is folded into [`DbError::Internal`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbError {
    #[error("collection '{0}' already exists")]
    CollectionAlreadyExists(String),

    #[error("collection '{0}' does not exist")]
    CollectionDoesNotExist(String),

    #[error("dimension cannot be zero")]
    DimensionCantBeZero,

    #[error("collection name cannot be empty")]
    NameEmpty,

    #[error("collection name is too long")]
    NameTooLong,

    #[error("collection name contains invalid characters")]
    NameInvalidChars,

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    VectorDimensionMismatch { expected: usize, actual: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
