//! HNSW index implementation.
//!
//! The graph is rebuilt incrementally and lazily: store mutations only touch
//! the pending sets, and the first query that observes pending work drains
//! them under the writer lock before searching.

use crate::graph::{LayerGraph, Neighbors};
use crate::layer::random_level;
use crate::{HnswError, Result};
use kombu_vector::{
    Distance, Index, IndexKind, Vector, VectorError, VectorId, VectorMatch, VectorStore,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::{Arc, Weak};

/// HNSW tuning parameters.
///
/// `m0 = 2m` (layer-0 degree cap) and `ml = 1/ln(m)` (level multiplier) are
/// derived, not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswParams {
    /// Distance function. `InnerProduct` is the negated dot product, so the
    /// graph's smaller-is-closer ordering holds for every choice.
    pub distance: Distance,

    /// Max connections per node above layer 0. Must be at least 2.
    /// Default: 16
    pub m: usize,

    /// Beam width during construction. Higher = better graph, slower build.
    /// Default: 64
    pub ef_construction: usize,

    /// Beam width during search. Higher = better recall, slower query.
    /// Default: 32
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            distance: Distance::Cosine,
            m: 16,
            ef_construction: 64,
            ef_search: 32,
        }
    }
}

impl HnswParams {
    /// Degree cap at layer 0: twice `m` for richer local connectivity.
    pub fn m0(&self) -> usize {
        2 * self.m
    }

    /// Level multiplier for the geometric level draw.
    pub fn ml(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }

    fn max_degree(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m0()
        } else {
            self.m
        }
    }
}

/// A scored node during search: ordered by `(distance, id)` ascending.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance: f64,
    id: VectorId,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.id.cmp(&other.id))
    }
}

/// Everything behind the index's single reader-writer lock.
#[derive(Debug, Default)]
struct HnswState {
    /// Ids currently wired into the graph.
    inserted: HashSet<VectorId>,
    /// Ids awaiting insertion at the next reconcile.
    to_insert: HashSet<VectorId>,
    /// Ids awaiting removal at the next reconcile.
    to_remove: HashSet<VectorId>,
    /// Top layer of each inserted node.
    levels: HashMap<VectorId, usize>,
    /// Adjacency per layer; index 0 is the bottom (densest) layer.
    layers: Vec<LayerGraph>,
    /// The node the descent starts from: always one with the greatest level.
    entry_point: Option<VectorId>,
}

impl HnswState {
    /// Highest populated layer, or -1 when the graph is empty.
    fn max_layer(&self) -> i64 {
        self.entry_point
            .and_then(|ep| self.levels.get(&ep))
            .map(|&level| level as i64)
            .unwrap_or(-1)
    }

    fn has_pending(&self) -> bool {
        !self.to_insert.is_empty() || !self.to_remove.is_empty()
    }
}

/// HNSW index over a collection's vector store.
///
/// Holds a non-owning handle to the store; if the collection is dropped the
/// index answers [`VectorError::StoreGone`] instead of crashing.
pub struct HnswIndex {
    params: HnswParams,
    store: Weak<VectorStore>,
    state: RwLock<HnswState>,
}

impl HnswIndex {
    /// Create an empty index observing `store`.
    pub fn new(store: Weak<VectorStore>, params: HnswParams) -> Self {
        debug_assert!(params.m >= 2, "m must be at least 2");
        Self {
            params,
            store,
            state: RwLock::new(HnswState::default()),
        }
    }

    /// The index's tuning parameters.
    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Number of ids currently wired into the graph (pending work excluded).
    pub fn len(&self) -> usize {
        self.state.read().inserted.len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the graph from the store's current contents.
    pub fn rebuild(&self) -> Result<()> {
        let store = self.store.upgrade().ok_or(VectorError::StoreGone)?;
        let mut state = self.state.write();
        *state = HnswState::default();
        state.to_insert = store.ids();
        self.reconcile(&mut state, &store);
        Ok(())
    }

    /// Search for the `k` nearest neighbors, reconciling pending work first.
    pub fn search_knn(&self, query: &Vector, k: usize) -> Result<Vec<VectorMatch>> {
        let store = self.store.upgrade().ok_or(VectorError::StoreGone)?;

        let mut state = self.state.read();
        if state.has_pending() {
            // Writers never upgrade in place: release, reconcile under the
            // writer lock, then reacquire for the search. Another reader may
            // have reconciled while we waited, hence the re-check.
            drop(state);
            {
                let mut writable = self.state.write();
                if writable.has_pending() {
                    self.reconcile(&mut writable, &store);
                }
            }
            state = self.state.read();
        }

        let Some(entry) = state.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }
        let k = k.min(state.inserted.len());

        let mut ep = vec![entry];
        let max_layer = state.max_layer();
        for layer in (1..=max_layer.max(0) as usize).rev() {
            if let Some(best) = self
                .search_layer(&state, &store, query, &ep, 1, layer)
                .first()
            {
                ep = vec![best.id];
            }
        }

        let ef = k.max(self.params.ef_search);
        let found = self.search_layer(&state, &store, query, &ep, ef, 0);

        Ok(found
            .into_iter()
            .take(k)
            .map(|c| VectorMatch {
                id: c.id,
                distance: c.distance,
                vector: store.get(c.id),
            })
            .collect())
    }

    /// Distance from `query` to the stored vector `id`, without cloning.
    ///
    /// An id whose vector has left the store scores as the maximum possible
    /// distance, so a racing removal degrades the ranking instead of
    /// aborting the search.
    fn distance_to(&self, store: &VectorStore, query: &Vector, id: VectorId) -> f64 {
        store.with_vectors(|vectors| match vectors.get(&id) {
            Some(v) => self.params.distance.distance(query.as_slice(), v.as_slice()),
            None => f64::MAX,
        })
    }

    /// Beam search within one layer.
    ///
    /// Returns the `ef` closest nodes to `query` reachable from
    /// `entry_points`, sorted ascending by `(distance, id)`. Maintains a
    /// min-heap of unexpanded candidates and a max-heap of current bests
    /// capped at `ef`.
    fn search_layer(
        &self,
        state: &HnswState,
        store: &VectorStore,
        query: &Vector,
        entry_points: &[VectorId],
        ef: usize,
        layer: usize,
    ) -> Vec<Candidate> {
        let Some(layer_graph) = state.layers.get(layer) else {
            return Vec::new();
        };

        let mut visited: HashSet<VectorId> = HashSet::new();
        let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();

        for &ep in entry_points {
            if !visited.insert(ep) {
                continue;
            }
            let seed = Candidate {
                distance: self.distance_to(store, query, ep),
                id: ep,
            };
            candidates.push(Reverse(seed));
            results.push(seed);
        }
        while results.len() > ef {
            results.pop();
        }

        while let Some(Reverse(current)) = candidates.pop() {
            if results.len() >= ef {
                let worst = results.peek().map(|c| c.distance).unwrap_or(f64::MAX);
                if current.distance > worst {
                    break;
                }
            }

            let Some(neighbors) = layer_graph.neighbors(current.id) else {
                continue;
            };
            for &neighbor in neighbors.iter() {
                if !visited.insert(neighbor) {
                    continue;
                }
                let distance = self.distance_to(store, query, neighbor);
                let admit = results.len() < ef
                    || results.peek().map(|w| distance < w.distance).unwrap_or(true);
                if admit {
                    let next = Candidate {
                        distance,
                        id: neighbor,
                    };
                    candidates.push(Reverse(next));
                    results.push(next);
                    while results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_sorted_vec()
    }

    /// Wire one node into the graph. `state` must already be reconciled for
    /// removals; the caller holds the writer lock.
    fn insert_node(
        &self,
        state: &mut HnswState,
        store: &Arc<VectorStore>,
        id: VectorId,
        vector: &Vector,
    ) {
        let level = random_level(self.params.ml());
        state.levels.insert(id, level);

        let Some(entry) = state.entry_point else {
            // First node: size the layer array before any adjacency write.
            state.layers.resize_with(level + 1, LayerGraph::new);
            for layer in 0..=level {
                state.layers[layer].ensure_node(id);
            }
            state.entry_point = Some(id);
            state.inserted.insert(id);
            return;
        };

        let max_layer = state.max_layer();

        // Descend through layers above the node's own top, carrying the
        // single nearest node as the next entry.
        let mut ep = vec![entry];
        let mut layer = max_layer;
        while layer > level as i64 {
            if let Some(best) = self
                .search_layer(state, store, vector, &ep, 1, layer as usize)
                .first()
            {
                ep = vec![best.id];
            }
            layer -= 1;
        }

        // Wire the node into every layer from its top (or the graph's top,
        // whichever is lower) down to 0.
        for layer in (0..=level.min(max_layer as usize)).rev() {
            let cap = self.params.max_degree(layer);
            let found =
                self.search_layer(state, store, vector, &ep, self.params.ef_construction, layer);
            let selected = select_neighbors_heuristic(&found, cap);

            state.layers[layer].ensure_node(id);
            for candidate in &selected {
                state.layers[layer].add_edge(id, candidate.id);
            }

            self.shrink_overfull_neighbors(state, store, id, layer, cap);

            ep = found.iter().map(|c| c.id).collect();
        }

        // A node taller than the graph becomes the new entry point; register
        // it in the fresh layers above the old top.
        if level as i64 > max_layer {
            if state.layers.len() <= level {
                state.layers.resize_with(level + 1, LayerGraph::new);
            }
            for layer in (max_layer + 1) as usize..=level {
                state.layers[layer].ensure_node(id);
            }
            state.entry_point = Some(id);
        }

        state.inserted.insert(id);
    }

    /// Re-run neighbor selection for any neighbor of `id` that exceeded the
    /// layer's degree cap, scoring against that neighbor's own vector, and
    /// drop the back-edges of everything pruned so edges stay symmetric.
    fn shrink_overfull_neighbors(
        &self,
        state: &mut HnswState,
        store: &Arc<VectorStore>,
        id: VectorId,
        layer: usize,
        cap: usize,
    ) {
        let neighbor_ids: Vec<VectorId> = state.layers[layer]
            .neighbors(id)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default();

        for target in neighbor_ids {
            let overfull = state.layers[layer]
                .neighbors(target)
                .map_or(false, |n| n.len() > cap);
            if !overfull {
                continue;
            }

            let target_vector = store.get(target);
            let mut scored: Vec<Candidate> = state.layers[layer]
                .neighbors(target)
                .map(|n| {
                    n.iter()
                        .map(|&other| Candidate {
                            distance: match &target_vector {
                                Some(v) => self.distance_to(store, v, other),
                                None => f64::MAX,
                            },
                            id: other,
                        })
                        .collect()
                })
                .unwrap_or_default();
            scored.sort_unstable();

            let keep: Neighbors = select_neighbors_heuristic(&scored, cap)
                .iter()
                .map(|c| c.id)
                .collect();
            for candidate in &scored {
                if !keep.contains(candidate.id) {
                    state.layers[layer].remove_edge_from(candidate.id, target);
                }
            }
            state.layers[layer].set_neighbors(target, keep);
        }
    }

    /// Drain the pending sets into the graph: removals first, then inserts.
    fn reconcile(&self, state: &mut HnswState, store: &Arc<VectorStore>) {
        Self::apply_removals(state);

        if state.to_insert.is_empty() {
            return;
        }
        let pending: Vec<VectorId> = state.to_insert.drain().collect();
        for id in pending {
            // The vector can have left the store between the add
            // notification and now; its remove notification is in flight
            // and skipping keeps the graph free of ghosts.
            let Some(vector) = store.get(id) else { continue };
            self.insert_node(state, store, id, &vector);
        }
    }

    /// Tombstone every pending removal and re-elect the entry point if it
    /// was among them.
    fn apply_removals(state: &mut HnswState) {
        if state.to_remove.is_empty() {
            return;
        }
        let doomed = std::mem::take(&mut state.to_remove);
        for &id in &doomed {
            for layer in &mut state.layers {
                layer.remove_node(id);
            }
            state.levels.remove(&id);
            state.inserted.remove(&id);
        }

        let entry_gone = state
            .entry_point
            .map_or(false, |ep| !state.inserted.contains(&ep));
        if entry_gone {
            // The survivor with the greatest level takes over; ties go to
            // the smallest id. The layer array shrinks to the new top.
            let new_entry = state
                .inserted
                .iter()
                .copied()
                .max_by_key(|id| (state.levels.get(id).copied().unwrap_or(0), Reverse(*id)));
            state.entry_point = new_entry;
            match new_entry {
                Some(entry) => {
                    let top = state.levels.get(&entry).copied().unwrap_or(0);
                    state.layers.truncate(top + 1);
                }
                None => {
                    state.layers.clear();
                    state.levels.clear();
                }
            }
        }
    }
}

/// Heuristic neighbor selection with backfill.
///
/// Walk the candidates in ascending distance, accepting an element only
/// when it advances the frontier (closer than the nearest already
/// accepted); park the rest and backfill the remaining slots from the
/// parked bin in ascending order.
fn select_neighbors_heuristic(candidates: &[Candidate], m: usize) -> Vec<Candidate> {
    let mut selected: Vec<Candidate> = Vec::with_capacity(m.min(candidates.len()));
    let mut discarded: Vec<Candidate> = Vec::new();

    for &candidate in candidates {
        if selected.len() >= m {
            break;
        }
        let advances = selected
            .first()
            .map_or(true, |nearest| candidate.distance < nearest.distance);
        if advances {
            selected.push(candidate);
        } else {
            discarded.push(candidate);
        }
    }

    if selected.len() < m {
        for candidate in discarded {
            if selected.len() >= m {
                break;
            }
            selected.push(candidate);
        }
    }

    selected
}

impl Index for HnswIndex {
    fn initialize(&self) -> kombu_vector::Result<()> {
        self.rebuild().map_err(|e| match e {
            HnswError::Vector(v) => v,
            other => VectorError::IndexError(other.to_string()),
        })
    }

    fn search_top_k(&self, query: &Vector, k: usize) -> kombu_vector::Result<Vec<VectorMatch>> {
        self.search_knn(query, k).map_err(|e| match e {
            HnswError::Vector(v) => v,
            other => VectorError::IndexError(other.to_string()),
        })
    }

    fn on_add(&self, ids: &[VectorId]) {
        let mut state = self.state.write();
        for &id in ids {
            // An overwrite invalidates the old neighborhood: schedule the
            // stale node for removal before the re-insert.
            if state.inserted.contains(&id) {
                state.to_remove.insert(id);
            }
            state.to_insert.insert(id);
        }
    }

    fn on_remove(&self, ids: &[VectorId]) {
        let mut state = self.state.write();
        for &id in ids {
            if !state.to_insert.remove(&id) {
                state.to_remove.insert(id);
            }
        }
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Hnsw
    }
}
