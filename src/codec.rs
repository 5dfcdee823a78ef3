//! On-disk archive format: a small versioned header in front of a
//! bincode-serialized body, so `process_requests` can load a frozen
//! catalogue/router without rebuilding anything.

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::catalogue::{Catalogue, StopId};
use crate::error::Error;
use crate::graph::{EdgeId, Graph};
use crate::router::TransitRouter;
use crate::settings::{RenderSettings, RoutingParameters};
use crate::shortest_paths::ShortestPaths;

const MAGIC: &[u8; 4] = b"TCAT";
const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ArchiveBody {
    catalogue: Catalogue,
    render_settings: RenderSettings,
    routing_parameters: RoutingParameters,
    graph: Graph<f64>,
    shortest_paths: ShortestPaths,
    edge_bus_name: HashMap<EdgeId, String>,
    edge_span_count: HashMap<EdgeId, u32>,
    stop_order: Vec<StopId>,
}

/// Writes `magic | version | bincode(ArchiveBody)` to `writer`.
pub fn write<W: Write>(
    writer: &mut W,
    catalogue: &Catalogue,
    render_settings: &RenderSettings,
    routing_parameters: &RoutingParameters,
    router: &TransitRouter,
) -> Result<(), Error> {
    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;

    let body = ArchiveBody {
        catalogue: catalogue.clone(),
        render_settings: render_settings.clone(),
        routing_parameters: *routing_parameters,
        graph: router.graph().clone(),
        shortest_paths: router.shortest_paths().clone(),
        edge_bus_name: router.edge_bus_name().clone(),
        edge_span_count: router.edge_span_count().clone(),
        stop_order: router.stop_order().to_vec(),
    };
    bincode::serialize_into(writer, &body)?;
    Ok(())
}

/// Checks every index a decoded `ArchiveBody` carries into another one of
/// its tables (stop ids into the stop arena, edge endpoints into the
/// vertex range, edge-metadata keys into the edge table) before any of it
/// is trusted by unchecked indexing downstream (e.g. `Catalogue::stops`,
/// `Graph::edge`).
fn validate_body(body: &ArchiveBody) -> Result<(), Error> {
    let stop_count = body.catalogue.stop_count();
    let in_range = |id: StopId| (id.0 as usize) < stop_count;

    for bus in body.catalogue.buses() {
        for &stop_id in &bus.stops {
            if !in_range(stop_id) {
                return Err(Error::ArchiveInconsistent(format!(
                    "bus {} references out-of-range stop id {}",
                    bus.name, stop_id.0
                )));
            }
        }
    }
    for (from, to) in body.catalogue.distance_pairs() {
        if !in_range(from) || !in_range(to) {
            return Err(Error::ArchiveInconsistent(format!(
                "distance entry references out-of-range stop id ({}, {})",
                from.0, to.0
            )));
        }
    }
    for &stop_id in &body.stop_order {
        if !in_range(stop_id) {
            return Err(Error::ArchiveInconsistent(format!(
                "stop_order references out-of-range stop id {}",
                stop_id.0
            )));
        }
    }
    if body.stop_order.len() * 2 != body.graph.vertex_count() {
        return Err(Error::ArchiveInconsistent(
            "stop_order length does not match graph vertex count".to_string(),
        ));
    }

    let vertex_count = body.graph.vertex_count();
    for edge in body.graph.edges() {
        if edge.from >= vertex_count || edge.to >= vertex_count {
            return Err(Error::ArchiveInconsistent(format!(
                "edge references out-of-range vertex ({}, {})",
                edge.from, edge.to
            )));
        }
    }

    let edge_count = body.graph.edge_count();
    for &edge_id in body.edge_bus_name.keys() {
        if edge_id >= edge_count {
            return Err(Error::ArchiveInconsistent(format!(
                "edge_bus_name references out-of-range edge id {edge_id}"
            )));
        }
    }
    for &edge_id in body.edge_span_count.keys() {
        if edge_id >= edge_count {
            return Err(Error::ArchiveInconsistent(format!(
                "edge_span_count references out-of-range edge id {edge_id}"
            )));
        }
    }

    Ok(())
}

pub struct LoadedArchive {
    pub catalogue: Catalogue,
    pub render_settings: RenderSettings,
    pub routing_parameters: RoutingParameters,
    pub router: TransitRouter,
}

/// Reads and validates an archive previously produced by `write`.
pub fn read<R: Read>(reader: &mut R) -> Result<LoadedArchive, Error> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|_| Error::CorruptArchive("truncated header".to_string()))?;
    if &magic != MAGIC {
        return Err(Error::CorruptArchive("bad magic".to_string()));
    }

    let mut version_bytes = [0u8; 4];
    reader
        .read_exact(&mut version_bytes)
        .map_err(|_| Error::CorruptArchive("truncated header".to_string()))?;
    let version = u32::from_le_bytes(version_bytes);
    if version != VERSION {
        return Err(Error::CorruptArchive(format!(
            "unsupported archive version {version}"
        )));
    }

    let body: ArchiveBody = bincode::deserialize_from(reader)?;
    validate_body(&body)?;

    let router = TransitRouter::rehydrate(
        body.graph,
        body.shortest_paths,
        body.edge_bus_name,
        body.edge_span_count,
        body.stop_order,
    );

    Ok(LoadedArchive {
        catalogue: body.catalogue,
        render_settings: body.render_settings,
        routing_parameters: body.routing_parameters,
        router,
    })
}
