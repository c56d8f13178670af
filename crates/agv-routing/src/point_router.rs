//! Shortest-path queries over one graph snapshot.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use agv_core::INFINITE_COSTS;

use crate::graph::PlantGraph;
use crate::route::{Orientation, Step};

/// No edge reaches this vertex yet.
const NO_EDGE: u32 = u32::MAX;

/// Wraps exactly one shortest-path engine bound to one [`PlantGraph`]
/// snapshot.
///
/// Queries never mutate the graph, so one router is safely shared by every
/// vehicle with the same weighting/exclusion profile.
///
/// Point names unknown to the snapshot are treated as unreachable:
/// [`cost`](Self::cost) returns [`INFINITE_COSTS`] and
/// [`route_steps`](Self::route_steps) returns `None`.  Callers that need
/// hard unknown-name errors validate against the plant model first (the
/// orchestrating router does).
pub struct PointRouter {
    graph: PlantGraph,
}

impl PointRouter {
    pub fn new(graph: PlantGraph) -> Self {
        Self { graph }
    }

    #[inline]
    pub fn graph(&self) -> &PlantGraph {
        &self.graph
    }

    /// Cheapest cost from `source` to `destination`: 0 if they are equal,
    /// [`INFINITE_COSTS`] if no route exists.
    pub fn cost(&self, source: &str, destination: &str) -> u64 {
        if source == destination {
            return 0;
        }
        let (Some(from), Some(to)) = (self.graph.vertex(source), self.graph.vertex(destination))
        else {
            return INFINITE_COSTS;
        };
        match self.dijkstra(from, to) {
            Some((cost, _)) => cost,
            None => INFINITE_COSTS,
        }
    }

    /// The cheapest step sequence from `source` to `destination`: an empty
    /// sequence if they are equal, `None` if no route exists.
    ///
    /// Each step carries its own edge cost and a running index from 0.
    pub fn route_steps(&self, source: &str, destination: &str) -> Option<Vec<Step>> {
        if source == destination {
            return Some(vec![]);
        }
        let (from, to) = (self.graph.vertex(source)?, self.graph.vertex(destination)?);
        let (_, edges) = self.dijkstra(from, to)?;

        let steps = edges
            .into_iter()
            .enumerate()
            .map(|(index, edge)| {
                let reversed = self.graph.edge_reversed(edge);
                Step {
                    path: Some(Arc::clone(self.graph.edge_path(edge))),
                    source: Arc::clone(self.graph.point(self.graph.edge_source(edge))),
                    destination: Arc::clone(self.graph.point(self.graph.edge_destination(edge))),
                    orientation: if reversed {
                        Orientation::Backward
                    } else {
                        Orientation::Forward
                    },
                    index,
                    cost: self.graph.edge_cost(edge),
                }
            })
            .collect();
        Some(steps)
    }

    // ── Dijkstra internals ────────────────────────────────────────────────

    /// Standard Dijkstra over the CSR graph.  Returns the total cost and the
    /// edge sequence, or `None` if `to` is unreachable from `from`.
    fn dijkstra(&self, from: u32, to: u32) -> Option<(u64, Vec<u32>)> {
        let n = self.graph.vertex_count();
        // dist[v] = best known cost to reach v.
        let mut dist = vec![INFINITE_COSTS; n];
        // prev_edge[v] = edge id that reached v; NO_EDGE for unreached vertices.
        let mut prev_edge = vec![NO_EDGE; n];

        dist[from as usize] = 0;

        // Min-heap: Reverse makes BinaryHeap (max) behave as min-heap.
        // Secondary key = vertex index for deterministic tie-breaking.
        let mut heap: BinaryHeap<Reverse<(u64, u32)>> = BinaryHeap::new();
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, vertex))) = heap.pop() {
            if vertex == to {
                return Some((cost, self.reconstruct(&prev_edge, to)));
            }

            // Skip stale heap entries.
            if cost > dist[vertex as usize] {
                continue;
            }

            for edge in self.graph.out_edges(vertex) {
                let neighbor = self.graph.edge_destination(edge);
                let new_cost = cost.saturating_add(self.graph.edge_cost(edge));

                if new_cost < dist[neighbor as usize] {
                    dist[neighbor as usize] = new_cost;
                    prev_edge[neighbor as usize] = edge;
                    heap.push(Reverse((new_cost, neighbor)));
                }
            }
        }

        None
    }

    fn reconstruct(&self, prev_edge: &[u32], to: u32) -> Vec<u32> {
        let mut edges = Vec::new();
        let mut cur = to;
        loop {
            let e = prev_edge[cur as usize];
            if e == NO_EDGE {
                break;
            }
            edges.push(e);
            cur = self.graph.edge_source(e);
        }
        edges.reverse();
        edges
    }
}
