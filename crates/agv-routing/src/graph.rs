//! Plant graph snapshot and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a vertex `v`, its outgoing edges occupy the index range:
//!
//! ```text
//! out_start[v] .. out_start[v+1]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_cost`, `edge_path`,
//! `edge_reversed`) are sorted by source vertex.  Iteration over a vertex's
//! outgoing edges is a contiguous memory scan — ideal for Dijkstra's inner
//! loop.
//!
//! # Snapshot semantics
//!
//! Building copies `Arc`s to the model's points and paths; later plant-model
//! edits can never reach a graph already handed to a point router.  Cache
//! invalidation (see [`PointRouterProvider`](crate::PointRouterProvider)) is
//! the sole edit-propagation mechanism.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use agv_core::{weight_to_cost, Path, Point, Vehicle, INFINITE_COSTS};

use crate::avoidance::ResourcesToAvoid;
use crate::evaluator::EdgeEvaluator;

// ── EdgeCandidate ─────────────────────────────────────────────────────────────

/// One directional traversal of a path, as offered to edge evaluators.
pub struct EdgeCandidate<'a> {
    pub path: &'a Path,
    /// `true` for the destination→source traversal of the path.
    pub reversed: bool,
}

// ── PlantGraph ────────────────────────────────────────────────────────────────

/// Directed weighted plant graph in CSR format.
///
/// The vertex set equals the point set exactly — isolated points get a
/// vertex with no edges.  Each non-excluded path contributes a forward edge
/// if traversable forwards and a reverse edge if traversable in reverse;
/// edges whose evaluated weight is infinite are omitted entirely (an
/// equivalent but cheaper representation than infinite-cost edges).
pub struct PlantGraph {
    /// Points in name-sorted order; the position is the vertex index.
    vertices: Vec<Arc<Point>>,
    /// Point name → vertex index.
    vertex_index: FxHashMap<String, u32>,

    /// CSR row pointer.  Length = `vertex_count + 1`.
    out_start: Vec<u32>,

    // Edge data, indexed by edge id = position in sorted order.
    edge_from: Vec<u32>,
    edge_to: Vec<u32>,
    edge_cost: Vec<u64>,
    edge_path: Vec<Arc<Path>>,
    edge_reversed: Vec<bool>,
}

struct RawEdge {
    from: u32,
    to: u32,
    cost: u64,
    path: Arc<Path>,
    reversed: bool,
}

impl PlantGraph {
    /// Build a graph snapshot for `vehicle`.
    ///
    /// Exclusions, applied per path:
    /// - named in `avoid.paths`, or either endpoint in `avoid.points`;
    /// - `locked` while `exclude_locked` is set;
    /// - a traversal direction with velocity 0 or infinite evaluated weight.
    ///
    /// The evaluator's lifecycle hooks are invoked exactly once around the
    /// weighting pass.  The caller's collections are not mutated.
    pub fn build(
        points: &[Arc<Point>],
        paths: &[Arc<Path>],
        vehicle: &Vehicle,
        avoid: &ResourcesToAvoid,
        evaluator: &dyn EdgeEvaluator,
        exclude_locked: bool,
    ) -> Self {
        // Name-sorted vertices make vertex indices — and therefore Dijkstra
        // tie-breaking — deterministic for a given point set.
        let mut vertices: Vec<Arc<Point>> = points.to_vec();
        vertices.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        vertices.dedup_by(|a, b| a.name == b.name);

        let vertex_index: FxHashMap<String, u32> = vertices
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i as u32))
            .collect();

        let mut sorted_paths: Vec<&Arc<Path>> = paths.iter().collect();
        sorted_paths.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        evaluator.on_computation_start(vehicle);

        let mut raw: Vec<RawEdge> = Vec::new();
        for path in sorted_paths {
            if exclude_locked && path.locked {
                continue;
            }
            if avoid.avoids_path(&path.name)
                || avoid.avoids_point(&path.source)
                || avoid.avoids_point(&path.destination)
            {
                continue;
            }
            let (Some(&src), Some(&dst)) = (
                vertex_index.get(&path.source),
                vertex_index.get(&path.destination),
            ) else {
                // A consistent plant model cannot produce this; guard
                // hand-built inputs.
                warn!(path = %path.name, "path endpoint missing from point set, skipping");
                continue;
            };

            if path.is_traversable_forward() {
                let cost = weight_to_cost(
                    evaluator.weight(&EdgeCandidate { path, reversed: false }, vehicle),
                );
                if cost != INFINITE_COSTS {
                    raw.push(RawEdge {
                        from: src,
                        to: dst,
                        cost,
                        path: Arc::clone(path),
                        reversed: false,
                    });
                }
            }
            if path.is_traversable_reverse() {
                let cost = weight_to_cost(
                    evaluator.weight(&EdgeCandidate { path, reversed: true }, vehicle),
                );
                if cost != INFINITE_COSTS {
                    raw.push(RawEdge {
                        from: dst,
                        to: src,
                        cost,
                        path: Arc::clone(path),
                        reversed: true,
                    });
                }
            }
        }

        evaluator.on_computation_end(vehicle);

        // Stable sort keeps same-source edges in path-name order.
        raw.sort_by_key(|e| e.from);

        let vertex_count = vertices.len();
        let edge_count = raw.len();

        let mut out_start = vec![0u32; vertex_count + 1];
        for e in &raw {
            out_start[e.from as usize + 1] += 1;
        }
        for i in 1..=vertex_count {
            out_start[i] += out_start[i - 1];
        }
        debug_assert_eq!(out_start[vertex_count] as usize, edge_count);

        Self {
            vertices,
            vertex_index,
            out_start,
            edge_from: raw.iter().map(|e| e.from).collect(),
            edge_to: raw.iter().map(|e| e.to).collect(),
            edge_cost: raw.iter().map(|e| e.cost).collect(),
            edge_path: raw.iter().map(|e| Arc::clone(&e.path)).collect(),
            edge_reversed: raw.iter().map(|e| e.reversed).collect(),
        }
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    // ── Lookup & traversal ────────────────────────────────────────────────

    /// Vertex index of a point name, if the point is in this snapshot.
    #[inline]
    pub fn vertex(&self, point_name: &str) -> Option<u32> {
        self.vertex_index.get(point_name).copied()
    }

    /// The point at a vertex index.
    #[inline]
    pub fn point(&self, vertex: u32) -> &Arc<Point> {
        &self.vertices[vertex as usize]
    }

    /// Iterator over the edge ids of all outgoing edges of `vertex`.
    ///
    /// A contiguous index range — no heap allocation.
    #[inline]
    pub fn out_edges(&self, vertex: u32) -> impl Iterator<Item = u32> + '_ {
        let start = self.out_start[vertex as usize];
        let end = self.out_start[vertex as usize + 1];
        start..end
    }

    #[inline]
    pub fn edge_source(&self, edge: u32) -> u32 {
        self.edge_from[edge as usize]
    }

    #[inline]
    pub fn edge_destination(&self, edge: u32) -> u32 {
        self.edge_to[edge as usize]
    }

    #[inline]
    pub fn edge_cost(&self, edge: u32) -> u64 {
        self.edge_cost[edge as usize]
    }

    #[inline]
    pub fn edge_path(&self, edge: u32) -> &Arc<Path> {
        &self.edge_path[edge as usize]
    }

    #[inline]
    pub fn edge_reversed(&self, edge: u32) -> bool {
        self.edge_reversed[edge as usize]
    }
}
