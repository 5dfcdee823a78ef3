//! The in-memory transit catalogue: interned stops and buses, asymmetric
//! road distances, and the stop→buses reverse index.

use std::collections::{HashMap, HashSet};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::geo::{great_circle_meters, Coordinates};

/// Stable integer id for a stop, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopId(pub u32);

/// Stable integer id for a bus, assigned in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub coords: Coordinates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub name: String,
    pub stops: Vec<StopId>,
    pub is_roundtrip: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BusInfo {
    pub stops_count: usize,
    pub unique_stops_count: usize,
    pub route_length: f64,
    pub curvature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopInfo {
    pub buses: Vec<String>,
}

/// Stops and buses held in append-only arenas (`Vec`), addressed by the
/// `StopId`/`BusId` assigned at insertion time rather than by borrowed
/// string-view/pointer identity (see DESIGN.md, Catalogue entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogue {
    stops: Vec<Stop>,
    stop_index: HashMap<String, StopId>,
    buses: Vec<Bus>,
    bus_index: HashMap<String, BusId>,
    stop_to_buses: Vec<BTreeSet<String>>,
    distances: HashMap<(StopId, StopId), f64>,
}

impl Default for Catalogue {
    fn default() -> Self {
        Catalogue {
            stops: Vec::new(),
            stop_index: HashMap::new(),
            buses: Vec::new(),
            bus_index: HashMap::new(),
            stop_to_buses: Vec::new(),
            distances: HashMap::new(),
        }
    }
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print_stats(&self) {
        println!("Transit catalogue:");
        println!("  Stops: {}", self.stops.len());
        println!("  Buses: {}", self.buses.len());
        println!("  Distance pairs: {}", self.distances.len());
    }

    fn get_or_create_stop(&mut self, name: &str) -> StopId {
        if let Some(&id) = self.stop_index.get(name) {
            return id;
        }
        let id = StopId(self.stops.len() as u32);
        self.stops.push(Stop {
            name: name.to_string(),
            coords: Coordinates::new(0.0, 0.0),
        });
        self.stop_to_buses.push(BTreeSet::new());
        self.stop_index.insert(name.to_string(), id);
        id
    }

    /// Creates the stop if unknown, or updates its coordinates if it already
    /// exists (e.g. as a placeholder registered by a prior `set_distance`).
    pub fn upsert_stop(&mut self, name: &str, coords: Coordinates) {
        let id = self.get_or_create_stop(name);
        self.stops[id.0 as usize].coords = coords;
    }

    /// Sets `Distance(from -> to) = meters`. See the asymmetric defaulting
    /// rule in SPEC_FULL.md §3: the reverse direction is seeded with the same
    /// value only if it has no value yet (explicit or defaulted).
    pub fn set_distance(&mut self, from: &str, to: &str, meters: f64) {
        let from_id = self.get_or_create_stop(from);
        let to_id = self.get_or_create_stop(to);
        self.distances.insert((from_id, to_id), meters);
        if !self.distances.contains_key(&(to_id, from_id)) {
            self.distances.insert((to_id, from_id), meters);
        }
    }

    /// Appends a bus. Fails with `UnknownStop` if any referenced stop name
    /// hasn't been registered via `upsert_stop`/`set_distance`.
    pub fn add_bus(
        &mut self,
        name: &str,
        stop_names: &[String],
        is_roundtrip: bool,
    ) -> Result<(), Error> {
        let mut stops = Vec::with_capacity(stop_names.len());
        for stop_name in stop_names {
            let id = self
                .stop_index
                .get(stop_name)
                .copied()
                .ok_or_else(|| Error::UnknownStop(stop_name.clone()))?;
            stops.push(id);
        }
        let id = BusId(self.buses.len() as u32);
        for &stop_id in &stops {
            self.stop_to_buses[stop_id.0 as usize].insert(name.to_string());
        }
        self.buses.push(Bus {
            name: name.to_string(),
            stops,
            is_roundtrip,
        });
        self.bus_index.insert(name.to_string(), id);
        Ok(())
    }

    pub fn find_stop(&self, name: &str) -> Option<&Stop> {
        self.stop_index.get(name).map(|&id| &self.stops[id.0 as usize])
    }

    pub fn find_stop_id(&self, name: &str) -> Option<StopId> {
        self.stop_index.get(name).copied()
    }

    pub fn find_bus(&self, name: &str) -> Option<&Bus> {
        self.bus_index.get(name).map(|&id| &self.buses[id.0 as usize])
    }

    pub fn stop_coords(&self, id: StopId) -> Coordinates {
        self.stops[id.0 as usize].coords
    }

    pub fn stop_name(&self, id: StopId) -> &str {
        &self.stops[id.0 as usize].name
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// All stops, in insertion order. Used by `TransitRouter` to assign
    /// vertex ids after lexicographic sorting.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// All buses, in insertion order.
    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn get_distance(&self, from: &str, to: &str) -> Result<f64, Error> {
        let from_id = self
            .find_stop_id(from)
            .ok_or_else(|| Error::UnknownStop(from.to_string()))?;
        let to_id = self
            .find_stop_id(to)
            .ok_or_else(|| Error::UnknownStop(to.to_string()))?;
        self.distance_by_id(from_id, to_id)
            .ok_or_else(|| Error::UnknownDistance(from.to_string(), to.to_string()))
    }

    pub(crate) fn distance_by_id(&self, from: StopId, to: StopId) -> Option<f64> {
        self.distances.get(&(from, to)).copied()
    }

    /// Every `(from, to)` pair with a recorded distance. Used by the codec
    /// to validate a loaded archive's stop ids before trusting them.
    pub(crate) fn distance_pairs(&self) -> impl Iterator<Item = (StopId, StopId)> + '_ {
        self.distances.keys().copied()
    }

    /// The sequence of stops actually traversed, after reflecting a
    /// non-roundtrip bus's declared stops for the return leg.
    pub fn materialized_traversal(&self, bus: &Bus) -> Vec<StopId> {
        if bus.is_roundtrip {
            bus.stops.clone()
        } else {
            let mut traversal = bus.stops.clone();
            traversal.extend(bus.stops.iter().rev().skip(1).copied());
            traversal
        }
    }

    pub fn bus_info(&self, name: &str) -> Option<BusInfo> {
        let bus = self.find_bus(name)?;
        let traversal = self.materialized_traversal(bus);

        let unique_stops_count = traversal.iter().collect::<HashSet<_>>().len();

        let mut route_length = 0.0;
        let mut geo_length = 0.0;
        for pair in traversal.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            route_length += self.distance_by_id(a, b)?;
            geo_length += great_circle_meters(self.stop_coords(a), self.stop_coords(b));
        }

        Some(BusInfo {
            stops_count: traversal.len(),
            unique_stops_count,
            route_length,
            curvature: route_length / geo_length,
        })
    }

    pub fn stop_info(&self, name: &str) -> Option<StopInfo> {
        let id = self.find_stop_id(name)?;
        Some(StopInfo {
            buses: self.stop_to_buses[id.0 as usize].iter().cloned().collect(),
        })
    }

    /// Stop names that have at least one bus passing through, lexicographically sorted.
    pub fn non_empty_stops(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .stops
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.stop_to_buses[*i].is_empty())
            .map(|(_, stop)| stop.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Buses, lexicographically sorted by name.
    pub fn non_empty_buses(&self) -> Vec<&Bus> {
        let mut buses: Vec<&Bus> = self.buses.iter().collect();
        buses.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        buses
    }

    /// Coordinates of every non-empty stop, for the renderer's projection bounds.
    pub fn non_empty_stop_coords(&self) -> Vec<Coordinates> {
        self.non_empty_stops()
            .into_iter()
            .filter_map(|name| self.find_stop(name))
            .map(|stop| stop.coords)
            .collect()
    }

    /// Mutable access to the bus arena, for corrupting an otherwise-valid
    /// catalogue in codec tests that exercise archive-validation rejections.
    #[cfg(test)]
    pub(crate) fn buses_mut(&mut self) -> &mut Vec<Bus> {
        &mut self.buses
    }

    /// Inserts a raw `(from, to)` distance entry without routing through
    /// `set_distance`'s defaulting rule, for codec tests that need an
    /// out-of-range `StopId` in the distance table.
    #[cfg(test)]
    pub(crate) fn insert_raw_distance(&mut self, from: StopId, to: StopId, meters: f64) {
        self.distances.insert((from, to), meters);
    }
}
