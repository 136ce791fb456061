//! HNSW (Hierarchical Navigable Small World) index for KombuDB.
//!
//! Approximate k-nearest-neighbor search over a layered proximity graph:
//!
//! - Higher layers hold exponentially fewer nodes and act as long-range
//!   shortcuts; layer 0 holds every node.
//! - Search descends greedily from the top layer, then runs a beam search
//!   of width `ef` at layer 0.
//!
//! # Lazy reconciliation
//!
//! The index never owns vectors: it observes its collection's store
//! through a `Weak` handle and is told about id-set deltas via
//! `on_add`/`on_remove`. Deltas land in pending sets; the graph itself is
//! only rewired when a query arrives and finds pending work:
//!
//! ```text
//! writer ──> store mutation ──> on_add/on_remove ──> pending sets
//! reader ──> sees pending ──> upgrades to writer ──> reconcile ──> search
//! ```
//!
//! Searches therefore always run against a quiescent graph, while the write
//! path stays a couple of hash-set insertions.
//!
//! # Parameters
//!
//! - `m`: max connections per node above layer 0 (default 16; layer 0
//!   allows `2m`)
//! - `ef_construction`: beam width while inserting (default 64)
//! - `ef_search`: beam width while querying (default 32)

mod graph;
mod index;
mod layer;

pub use index::{HnswIndex, HnswParams};

/// Error type for HNSW operations.
#[derive(Debug, thiserror::Error)]
pub enum HnswError {
    #[error("vector error: {0}")]
    Vector(#[from] kombu_vector::VectorError),

    #[error("graph error: {0}")]
    Graph(String),
}

/// Result type for HNSW operations.
pub type Result<T> = std::result::Result<T, HnswError>;
