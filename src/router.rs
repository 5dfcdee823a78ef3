//! Maps the catalogue onto a two-vertex-per-stop routing graph and answers
//! fastest-journey queries over its precomputed shortest-path table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalogue::{Catalogue, StopId};
use crate::error::Error;
use crate::graph::{EdgeId, Graph, VertexId};
use crate::settings::RoutingParameters;
use crate::shortest_paths::ShortestPaths;

fn arrive_vertex(rank: usize) -> VertexId {
    rank * 2
}

fn board_vertex(rank: usize) -> VertexId {
    rank * 2 + 1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RouteStep {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: u32, time: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub total_time: f64,
    pub items: Vec<RouteStep>,
}

/// Not `Serialize`/`Deserialize` itself — `Codec` persists its constituent
/// fields directly via the accessors below and reassembles it with
/// `rehydrate`, since the transient `stop_rank` index must be rebuilt rather
/// than round-tripped.
#[derive(Debug, Clone)]
pub struct TransitRouter {
    graph: Graph<f64>,
    shortest_paths: ShortestPaths,
    edge_bus_name: HashMap<EdgeId, String>,
    edge_span_count: HashMap<EdgeId, u32>,
    /// `stop_order[k]` is the stop occupying vertices `2k`/`2k+1`, i.e. the
    /// `k`-th stop in lexicographic order by name.
    stop_order: Vec<StopId>,
    stop_rank: HashMap<StopId, usize>,
}

impl TransitRouter {
    /// Builds a fresh routing graph and shortest-path table from a catalogue.
    pub fn build(catalogue: &Catalogue, params: &RoutingParameters) -> Result<TransitRouter, Error> {
        if params.bus_velocity <= 0.0 {
            return Err(Error::InvalidSettings(
                "bus_velocity must be positive".to_string(),
            ));
        }

        let mut ordered: Vec<(StopId, &str)> = catalogue
            .stops()
            .iter()
            .enumerate()
            .map(|(i, stop)| (StopId(i as u32), stop.name.as_str()))
            .collect();
        ordered.sort_unstable_by_key(|&(_, name)| name);
        let stop_order: Vec<StopId> = ordered.iter().map(|&(id, _)| id).collect();
        let stop_rank: HashMap<StopId, usize> = stop_order
            .iter()
            .enumerate()
            .map(|(k, &id)| (id, k))
            .collect();

        let mut graph: Graph<f64> = Graph::new(stop_order.len() * 2);
        let mut edge_bus_name = HashMap::new();
        let mut edge_span_count = HashMap::new();

        for k in 0..stop_order.len() {
            graph.add_edge(arrive_vertex(k), board_vertex(k), params.bus_wait_time as f64);
        }

        let meters_per_minute = params.meters_per_minute();
        for bus in catalogue.buses() {
            let traversal = catalogue.materialized_traversal(bus);
            let mut prefix = vec![0.0; traversal.len()];
            for w in 1..traversal.len() {
                let (a, b) = (traversal[w - 1], traversal[w]);
                let meters = catalogue.distance_by_id(a, b).ok_or_else(|| {
                    Error::UnknownDistance(
                        catalogue.stop_name(a).to_string(),
                        catalogue.stop_name(b).to_string(),
                    )
                })?;
                prefix[w] = prefix[w - 1] + meters;
            }

            for i in 0..traversal.len() {
                for j in (i + 1)..traversal.len() {
                    let from_rank = stop_rank[&traversal[i]];
                    let to_rank = stop_rank[&traversal[j]];
                    let weight = (prefix[j] - prefix[i]) / meters_per_minute;
                    let edge_id =
                        graph.add_edge(board_vertex(from_rank), arrive_vertex(to_rank), weight);
                    edge_bus_name.insert(edge_id, bus.name.clone());
                    edge_span_count.insert(edge_id, (j - i) as u32);
                }
            }
        }

        let shortest_paths = ShortestPaths::build(&graph);

        Ok(TransitRouter {
            graph,
            shortest_paths,
            edge_bus_name,
            edge_span_count,
            stop_order,
            stop_rank,
        })
    }

    /// Reassembles a router from a `Codec`-loaded archive: no graph or
    /// shortest-path recomputation, just rebuilding the transient rank index.
    pub fn rehydrate(
        graph: Graph<f64>,
        shortest_paths: ShortestPaths,
        edge_bus_name: HashMap<EdgeId, String>,
        edge_span_count: HashMap<EdgeId, u32>,
        stop_order: Vec<StopId>,
    ) -> TransitRouter {
        let stop_rank = stop_order
            .iter()
            .enumerate()
            .map(|(k, &id)| (id, k))
            .collect();
        TransitRouter {
            graph,
            shortest_paths,
            edge_bus_name,
            edge_span_count,
            stop_order,
            stop_rank,
        }
    }

    pub fn graph(&self) -> &Graph<f64> {
        &self.graph
    }

    pub fn shortest_paths(&self) -> &ShortestPaths {
        &self.shortest_paths
    }

    pub fn edge_bus_name(&self) -> &HashMap<EdgeId, String> {
        &self.edge_bus_name
    }

    pub fn edge_span_count(&self) -> &HashMap<EdgeId, u32> {
        &self.edge_span_count
    }

    pub fn stop_order(&self) -> &[StopId] {
        &self.stop_order
    }

    /// Fastest journey from `from` to `to`, entering and exiting at the
    /// "arrive" vertex of each (no terminal wait is counted: the route ends
    /// the instant the bus pulls in, before whatever wait would be needed to
    /// board again). `None` if either stop is unknown or no path exists.
    pub fn route(&self, catalogue: &Catalogue, from: &str, to: &str) -> Option<Itinerary> {
        let from_id = catalogue.find_stop_id(from)?;
        let to_id = catalogue.find_stop_id(to)?;
        if from_id == to_id {
            return Some(Itinerary {
                total_time: 0.0,
                items: Vec::new(),
            });
        }

        let src = arrive_vertex(*self.stop_rank.get(&from_id)?);
        let dst = arrive_vertex(*self.stop_rank.get(&to_id)?);
        let result = self.shortest_paths.build_route(&self.graph, src, dst)?;

        let items = result
            .edges
            .into_iter()
            .map(|edge_id| {
                let edge = self.graph.edge(edge_id);
                if let Some(bus_name) = self.edge_bus_name.get(&edge_id) {
                    RouteStep::Bus {
                        bus: bus_name.clone(),
                        span_count: self.edge_span_count[&edge_id],
                        time: edge.weight,
                    }
                } else {
                    let stop_id = self.stop_order[edge.from / 2];
                    RouteStep::Wait {
                        stop_name: catalogue.stop_name(stop_id).to_string(),
                        time: edge.weight,
                    }
                }
            })
            .collect();

        Some(Itinerary {
            total_time: result.weight,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;

    fn build_s1() -> Catalogue {
        let mut cat = Catalogue::new();
        cat.upsert_stop("Flower", Coordinates::new(2.0, 2.0));
        cat.upsert_stop("Honey", Coordinates::new(2.0, 2.0));
        cat.upsert_stop("Tree", Coordinates::new(2.0, 3.0));
        cat.set_distance("Flower", "Honey", 600.0);
        cat.set_distance("Honey", "Tree", 600.0);
        cat.add_bus(
            "001",
            &["Flower".to_string(), "Honey".to_string(), "Tree".to_string()],
            true,
        )
        .unwrap();
        cat
    }

    #[test]
    fn rejects_nonpositive_velocity() {
        let cat = build_s1();
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 0.0,
        };
        assert!(matches!(
            TransitRouter::build(&cat, &params),
            Err(Error::InvalidSettings(_))
        ));
    }

    #[test]
    fn same_stop_is_zero_time_no_steps() {
        let cat = build_s1();
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        let itinerary = router.route(&cat, "Flower", "Flower").unwrap();
        assert_eq!(itinerary.total_time, 0.0);
        assert!(itinerary.items.is_empty());
    }

    #[test]
    fn straight_ride_is_wait_then_bus() {
        let cat = build_s1();
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        let itinerary = router.route(&cat, "Flower", "Honey").unwrap();
        assert_eq!(itinerary.items.len(), 2);
        assert!(matches!(itinerary.items[0], RouteStep::Wait { .. }));
        match &itinerary.items[1] {
            RouteStep::Bus { bus, span_count, .. } => {
                assert_eq!(bus, "001");
                assert_eq!(*span_count, 1);
            }
            _ => panic!("expected a bus step"),
        }
    }

    #[test]
    fn s5_route_with_transfer_penalty() {
        let mut cat = Catalogue::new();
        cat.upsert_stop("X", Coordinates::new(0.0, 0.0));
        cat.upsert_stop("Y", Coordinates::new(0.0, 0.01));
        cat.set_distance("X", "Y", 1000.0);
        cat.add_bus("1", &["X".to_string(), "Y".to_string()], true)
            .unwrap();
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        let itinerary = router.route(&cat, "X", "Y").unwrap();
        assert!((itinerary.total_time - 7.5).abs() < 1e-9);
        assert_eq!(itinerary.items.len(), 2);
        match &itinerary.items[0] {
            RouteStep::Wait { stop_name, time } => {
                assert_eq!(stop_name, "X");
                assert_eq!(*time, 6.0);
            }
            _ => panic!("expected a wait step first"),
        }
        match &itinerary.items[1] {
            RouteStep::Bus { bus, span_count, time } => {
                assert_eq!(bus, "1");
                assert_eq!(*span_count, 1);
                assert!((*time - 1.5).abs() < 1e-9);
            }
            _ => panic!("expected a bus step second"),
        }
    }

    #[test]
    fn unreachable_stop_is_none() {
        let mut cat = build_s1();
        cat.upsert_stop("Island", Coordinates::new(0.0, 0.0));
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        assert!(router.route(&cat, "Flower", "Island").is_none());
    }

    #[test]
    fn unknown_stop_is_none() {
        let cat = build_s1();
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        assert!(router.route(&cat, "Flower", "Nowhere").is_none());
    }
}
