//! All-pairs shortest paths over a `Graph<f64>`, precomputed once and frozen
//! into a dense table so a later process can answer route queries without
//! rebuilding anything.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::graph::{EdgeId, Graph, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathEntry {
    pub weight: f64,
    pub prev_edge: Option<EdgeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortestPaths {
    /// `table[src][dst]`, dense `V x V`.
    table: Vec<Vec<Option<PathEntry>>>,
}

pub struct RouteResult {
    pub weight: f64,
    pub edges: Vec<EdgeId>,
}

/// Min-heap entry ordered by cost; ties broken arbitrarily here since the
/// deterministic tie-break lives in the relaxation rule, not the pop order.
#[derive(PartialEq)]
struct HeapEntry {
    cost: f64,
    vertex: VertexId,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the smallest cost first.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ShortestPaths {
    pub fn build(graph: &Graph<f64>) -> ShortestPaths {
        let n = graph.vertex_count();
        let mut table = vec![vec![None; n]; n];

        for source in 0..n {
            table[source][source] = Some(PathEntry {
                weight: 0.0,
                prev_edge: None,
            });

            let row = &mut table[source];
            let mut heap = BinaryHeap::new();
            let mut visited = vec![false; n];
            heap.push(HeapEntry {
                cost: 0.0,
                vertex: source,
            });

            while let Some(HeapEntry { cost, vertex }) = heap.pop() {
                if visited[vertex] {
                    continue;
                }
                visited[vertex] = true;

                for &edge_id in graph.incident_edges(vertex) {
                    let edge = graph.edge(edge_id);
                    if edge.to == source {
                        // T[source][source] is fixed at (0, none) by definition.
                        continue;
                    }
                    let candidate = cost + edge.weight;
                    let should_replace = match &row[edge.to] {
                        None => true,
                        Some(existing) if candidate < existing.weight => true,
                        Some(existing) if candidate == existing.weight => {
                            existing.prev_edge.map_or(false, |e| edge_id < e)
                        }
                        _ => false,
                    };
                    if should_replace {
                        let distance_improved = row[edge.to]
                            .as_ref()
                            .map_or(true, |existing| candidate < existing.weight);
                        row[edge.to] = Some(PathEntry {
                            weight: candidate,
                            prev_edge: Some(edge_id),
                        });
                        if distance_improved {
                            heap.push(HeapEntry {
                                cost: candidate,
                                vertex: edge.to,
                            });
                        }
                    }
                }
            }
        }

        ShortestPaths { table }
    }

    pub fn weight(&self, src: VertexId, dst: VertexId) -> Option<f64> {
        self.table[src][dst].map(|entry| entry.weight)
    }

    pub fn build_route(&self, graph: &Graph<f64>, src: VertexId, dst: VertexId) -> Option<RouteResult> {
        let entry = self.table[src][dst]?;
        let mut edges = Vec::new();
        let mut current = dst;
        while current != src {
            let prev_edge = self.table[src][current]?.prev_edge?;
            edges.push(prev_edge);
            current = graph.edge(prev_edge).from;
        }
        edges.reverse();
        Some(RouteResult {
            weight: entry.weight,
            edges,
        })
    }
}
