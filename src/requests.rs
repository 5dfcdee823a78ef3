//! The JSON wire schema for `make_base`/`process_requests`, and the glue
//! that applies a decoded request batch to a `Catalogue`/`TransitRouter`
//! and renders a response.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalogue::Catalogue;
use crate::error::Error;
use crate::geo::Coordinates;
use crate::render;
use crate::router::TransitRouter;
use crate::settings::{RenderSettings, RoutingParameters};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum BaseRequest {
    Stop {
        name: String,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        road_distances: HashMap<String, f64>,
    },
    Bus {
        name: String,
        stops: Vec<String>,
        is_roundtrip: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerializationSettings {
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MakeBaseInput {
    pub base_requests: Vec<BaseRequest>,
    pub render_settings: RenderSettings,
    pub routing_settings: RoutingParameters,
    pub serialization_settings: SerializationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum StatRequest {
    Bus { id: u64, name: String },
    Stop { id: u64, name: String },
    Map { id: u64 },
    Route { id: u64, from: String, to: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRequestsInput {
    pub stat_requests: Vec<StatRequest>,
    pub serialization_settings: SerializationSettings,
}

/// Applies stop upserts and distance declarations, then buses, matching the
/// build-time ordering invariant (stops and distances settle before any bus
/// references them).
pub fn apply_base_requests(catalogue: &mut Catalogue, requests: &[BaseRequest]) -> Result<(), Error> {
    for req in requests {
        if let BaseRequest::Stop {
            name,
            latitude,
            longitude,
            ..
        } = req
        {
            catalogue.upsert_stop(name, Coordinates::new(*latitude, *longitude));
        }
    }
    for req in requests {
        if let BaseRequest::Stop {
            name, road_distances, ..
        } = req
        {
            for (other, meters) in road_distances {
                catalogue.set_distance(name, other, *meters);
            }
        }
    }
    for req in requests {
        if let BaseRequest::Bus {
            name,
            stops,
            is_roundtrip,
        } = req
        {
            catalogue.add_bus(name, stops, *is_roundtrip)?;
        }
    }
    Ok(())
}

fn not_found(request_id: u64) -> Value {
    json!({ "request_id": request_id, "error_message": "not found" })
}

/// Answers one stat request, producing the exact JSON object the response
/// array carries for it.
pub fn answer(
    request: &StatRequest,
    catalogue: &Catalogue,
    router: &TransitRouter,
    render_settings: &RenderSettings,
) -> Value {
    match request {
        StatRequest::Bus { id, name } => match catalogue.bus_info(name) {
            Some(info) => json!({
                "request_id": id,
                "route_length": info.route_length,
                "curvature": info.curvature,
                "stop_count": info.stops_count,
                "unique_stop_count": info.unique_stops_count,
            }),
            None => not_found(*id),
        },
        StatRequest::Stop { id, name } => match catalogue.stop_info(name) {
            Some(info) => json!({ "request_id": id, "buses": info.buses }),
            None => not_found(*id),
        },
        StatRequest::Map { id } => {
            let svg = render::render_map(catalogue, render_settings);
            json!({ "request_id": id, "map": svg })
        }
        StatRequest::Route { id, from, to } => match router.route(catalogue, from, to) {
            Some(itinerary) => json!({
                "request_id": id,
                "total_time": itinerary.total_time,
                "items": itinerary.items,
            }),
            None => not_found(*id),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Color;

    fn render_settings() -> RenderSettings {
        RenderSettings {
            width: 600.0,
            height: 400.0,
            padding: 50.0,
            line_width: 14.0,
            stop_radius: 5.0,
            bus_label_font_size: 20,
            bus_label_offset: (7.0, 15.0),
            stop_label_font_size: 20,
            stop_label_offset: (7.0, -3.0),
            underlayer_color: Color::Rgba(255, 255, 255, 0.85),
            underlayer_width: 3.0,
            color_palette: vec![Color::Named("green".to_string())],
        }
    }

    #[test]
    fn applies_stops_distances_then_buses() {
        let requests: Vec<BaseRequest> = serde_json::from_value(json!([
            {"type": "Stop", "name": "Flower", "latitude": 2.0, "longitude": 2.0, "road_distances": {"Honey": 600.0}},
            {"type": "Stop", "name": "Honey", "latitude": 2.1, "longitude": 2.1},
            {"type": "Bus", "name": "001", "stops": ["Flower", "Honey"], "is_roundtrip": true}
        ]))
        .unwrap();
        let mut cat = Catalogue::new();
        apply_base_requests(&mut cat, &requests).unwrap();
        assert_eq!(cat.get_distance("Flower", "Honey").unwrap(), 600.0);
        assert_eq!(cat.get_distance("Honey", "Flower").unwrap(), 600.0);
        assert!(cat.find_bus("001").is_some());
    }

    #[test]
    fn bus_answer_not_found_shape() {
        let cat = Catalogue::new();
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        let response = answer(
            &StatRequest::Bus {
                id: 1,
                name: "751".to_string(),
            },
            &cat,
            &router,
            &render_settings(),
        );
        assert_eq!(response, json!({"request_id": 1, "error_message": "not found"}));
    }

    #[test]
    fn map_answer_contains_svg() {
        let cat = Catalogue::new();
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        let response = answer(&StatRequest::Map { id: 7 }, &cat, &router, &render_settings());
        assert_eq!(response["request_id"], 7);
        assert!(response["map"].as_str().unwrap().starts_with("<?xml"));
    }

    /// S6: build the S5 fixture, answer one request of each kind, round-trip
    /// through the archive codec, and confirm every answer is byte-identical
    /// before and after — testable property #4 (archive round-trip).
    #[test]
    fn answers_are_identical_across_an_archive_round_trip() {
        let requests: Vec<BaseRequest> = serde_json::from_value(json!([
            {"type": "Stop", "name": "X", "latitude": 0.0, "longitude": 0.0, "road_distances": {"Y": 1000.0}},
            {"type": "Stop", "name": "Y", "latitude": 0.0, "longitude": 0.01},
            {"type": "Bus", "name": "1", "stops": ["X", "Y"], "is_roundtrip": true}
        ]))
        .unwrap();
        let mut cat = Catalogue::new();
        apply_base_requests(&mut cat, &requests).unwrap();

        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        let router = TransitRouter::build(&cat, &params).unwrap();
        let settings = render_settings();

        let stat_requests = vec![
            StatRequest::Bus {
                id: 1,
                name: "1".to_string(),
            },
            StatRequest::Stop {
                id: 2,
                name: "X".to_string(),
            },
            StatRequest::Map { id: 3 },
            StatRequest::Route {
                id: 4,
                from: "X".to_string(),
                to: "Y".to_string(),
            },
        ];
        let before: Vec<Value> = stat_requests
            .iter()
            .map(|req| answer(req, &cat, &router, &settings))
            .collect();

        let mut bytes = Vec::new();
        crate::codec::write(&mut bytes, &cat, &settings, &params, &router).unwrap();
        let loaded = crate::codec::read(&mut bytes.as_slice()).unwrap();

        let after: Vec<Value> = stat_requests
            .iter()
            .map(|req| {
                answer(
                    req,
                    &loaded.catalogue,
                    &loaded.router,
                    &loaded.render_settings,
                )
            })
            .collect();

        assert_eq!(before, after);
        assert_eq!(
            after[3],
            json!({
                "request_id": 4,
                "total_time": 7.5,
                "items": [
                    {"type": "Wait", "stop_name": "X", "time": 6.0},
                    {"type": "Bus", "bus": "1", "span_count": 1, "time": 1.5},
                ],
            })
        );
    }
}
