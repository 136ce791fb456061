//! End-to-end scenarios against the database facade.

use kombu_db::{Database, DbError, IndexConfig};
use kombu_hnsw::HnswParams;
use kombu_vector::{Distance, Vector, VectorId};

fn small_hnsw() -> IndexConfig {
    IndexConfig::Hnsw(HnswParams {
        distance: Distance::Euclidean,
        m: 4,
        ef_construction: 10,
        ef_search: 10,
    })
}

fn seeded_db() -> Database {
    let db = Database::new();
    db.create_collection("c", 2).unwrap();
    db.add_vectors(
        "c",
        vec![
            (1, Vector::new(vec![0.0, 0.0])),
            (2, Vector::new(vec![1.0, 0.0])),
            (3, Vector::new(vec![0.0, 1.0])),
            (4, Vector::new(vec![10.0, 10.0])),
        ],
    )
    .unwrap();
    db
}

#[test]
fn test_basic_search() {
    let db = seeded_db();

    let hits = db
        .search("c", &Vector::new(vec![0.1, 0.1]), 2, None)
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, 1);
    assert!((hits[0].distance - 0.02f64.sqrt()).abs() < 1e-9);
    // Ids 2 and 3 tie for second place
    assert!(hits[1].id == 2 || hits[1].id == 3);
}

#[test]
fn test_search_after_deletion() {
    let db = seeded_db();
    assert_eq!(db.delete_vectors("c", &[1]).unwrap(), 1);

    let hits = db
        .search("c", &Vector::new(vec![0.0, 0.0]), 3, None)
        .unwrap();

    let ids: Vec<VectorId> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![2, 3, 4]);
    assert!((hits[0].distance - 1.0).abs() < 1e-9);
    assert!((hits[1].distance - 1.0).abs() < 1e-9);
    assert!((hits[2].distance - 200.0f64.sqrt()).abs() < 1e-9);
}

#[test]
fn test_hnsw_matches_brute_force_reference() {
    let db = seeded_db();
    assert!(db.add_index("c", "h", small_hnsw()).unwrap());

    let query = Vector::new(vec![0.1, 0.1]);
    let via_index = db.search("c", &query, 2, Some("h")).unwrap();
    let reference = db.search("c", &query, 2, None).unwrap();

    let mut got: Vec<VectorId> = via_index.iter().map(|h| h.id).collect();
    let mut want: Vec<VectorId> = reference.iter().map(|h| h.id).collect();
    got.sort_unstable();
    want.sort_unstable();
    assert_eq!(got, want);
    assert!((via_index[0].distance - reference[0].distance).abs() < 1e-9);
}

#[test]
fn test_dimension_mismatch_rejected_without_side_effects() {
    let db = seeded_db();

    let result = db.add_vectors("c", vec![(9, Vector::new(vec![1.0, 2.0, 3.0]))]);
    assert_eq!(
        result,
        Err(DbError::VectorDimensionMismatch {
            expected: 2,
            actual: 3
        })
    );
    assert!(db.get_vector("c", 9).unwrap().is_none());
    assert_eq!(db.describe_collection("c").unwrap().dimension, 2);
}

#[test]
fn test_hyphenated_name_rejected() {
    let db = Database::new();
    assert_eq!(
        db.create_collection("bad-name", 2),
        Err(DbError::NameInvalidChars)
    );
    assert!(db.list_collections().is_empty());
}

#[test]
fn test_delete_is_idempotent() {
    let db = seeded_db();

    assert_eq!(db.delete_vectors("c", &[2, 3]).unwrap(), 2);
    let after_first = {
        let mut ids: Vec<VectorId> = db
            .search("c", &Vector::new(vec![0.0, 0.0]), 10, None)
            .unwrap()
            .iter()
            .map(|h| h.id)
            .collect();
        ids.sort_unstable();
        ids
    };

    // Same deletion again: nothing removed, same observable state
    assert_eq!(db.delete_vectors("c", &[2, 3]).unwrap(), 0);
    let after_second = {
        let mut ids: Vec<VectorId> = db
            .search("c", &Vector::new(vec![0.0, 0.0]), 10, None)
            .unwrap()
            .iter()
            .map(|h| h.id)
            .collect();
        ids.sort_unstable();
        ids
    };
    assert_eq!(after_first, after_second);
    assert_eq!(after_first, vec![1, 4]);
}

#[test]
fn test_upsert_round_trip_overwrites() {
    let db = seeded_db();

    db.add_vectors("c", vec![(4, Vector::new(vec![0.2, 0.2]))])
        .unwrap();
    assert_eq!(
        db.get_vector("c", 4).unwrap(),
        Some(Vector::new(vec![0.2, 0.2]))
    );

    // The next search sees the new payload
    let hits = db
        .search("c", &Vector::new(vec![0.2, 0.2]), 1, None)
        .unwrap();
    assert_eq!(hits[0].id, 4);
    assert!(hits[0].distance < 1e-9);
}

#[test]
fn test_overwrite_visible_through_hnsw() {
    let db = seeded_db();
    db.add_index("c", "h", small_hnsw()).unwrap();
    db.search("c", &Vector::new(vec![0.0, 0.0]), 1, Some("h"))
        .unwrap();

    db.add_vectors("c", vec![(4, Vector::new(vec![0.2, 0.2]))])
        .unwrap();

    let hits = db
        .search("c", &Vector::new(vec![0.2, 0.2]), 1, Some("h"))
        .unwrap();
    assert_eq!(hits[0].id, 4);
    assert!(hits[0].distance < 1e-9);
}

#[test]
fn test_empty_collection_and_k_bounds() {
    let db = Database::new();
    db.create_collection("empty", 4).unwrap();
    db.add_index("empty", "h", small_hnsw()).unwrap();

    for index in [None, Some("h")] {
        let hits = db
            .search("empty", &Vector::new(vec![0.0; 4]), 7, index)
            .unwrap();
        assert!(hits.is_empty());
    }

    db.add_vectors("empty", vec![(1, Vector::new(vec![0.0; 4]))])
        .unwrap();
    for index in [None, Some("h")] {
        assert!(db
            .search("empty", &Vector::new(vec![0.0; 4]), 0, index)
            .unwrap()
            .is_empty());
        assert_eq!(
            db.search("empty", &Vector::new(vec![0.0; 4]), 100, index)
                .unwrap()
                .len(),
            1
        );
    }
}

#[test]
fn test_wide_beam_search_converges_to_brute_force() {
    let n = 60u64;
    let db = Database::new();
    db.create_collection("c", 8).unwrap();

    let batch: Vec<(VectorId, Vector)> = (0..n)
        .map(|i| {
            let data: Vec<f32> = (0..8)
                .map(|j| (((i * 31 + j * 17) % 101) as f32) * 0.37)
                .collect();
            (i, Vector::new(data))
        })
        .collect();
    db.add_vectors("c", batch).unwrap();

    db.add_index(
        "c",
        "wide",
        IndexConfig::Hnsw(HnswParams {
            distance: Distance::Euclidean,
            m: 4,
            ef_construction: 32,
            ef_search: 64, // beam covers the whole collection
        }),
    )
    .unwrap();

    let query = Vector::new(vec![5.0; 8]);

    // Full-coverage beam makes the graph search exact
    let graph = db.search("c", &query, n as usize, Some("wide")).unwrap();
    let brute = db.search("c", &query, n as usize, None).unwrap();
    assert_eq!(graph.len(), brute.len());
    let graph_ids: Vec<VectorId> = graph.iter().map(|h| h.id).collect();
    let brute_ids: Vec<VectorId> = brute.iter().map(|h| h.id).collect();
    assert_eq!(graph_ids, brute_ids);

    let graph_top = db.search("c", &query, 10, Some("wide")).unwrap();
    let brute_top = db.search("c", &query, 10, None).unwrap();
    for (g, b) in graph_top.iter().zip(&brute_top) {
        assert_eq!(g.id, b.id);
        assert!((g.distance - b.distance).abs() < 1e-9);
    }
}
