//! Renders the catalogue as an SVG map. A direct, mechanical port of the
//! reference `SphereProjector` + drawing order: projection math and layer
//! ordering are fixed, not a design surface.

use std::fmt::Write as _;

use crate::catalogue::Catalogue;
use crate::geo::Coordinates;
use crate::settings::{Color, RenderSettings};

const EPSILON: f64 = 1e-6;

struct Projector {
    min_lon: f64,
    max_lat: f64,
    zoom: f64,
    padding: f64,
}

impl Projector {
    fn new(points: &[Coordinates], width: f64, height: f64, padding: f64) -> Projector {
        let (mut min_lon, mut max_lon, mut min_lat, mut max_lat) =
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_lon = min_lon.min(p.lon);
            max_lon = max_lon.max(p.lon);
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
        }
        if points.is_empty() {
            min_lon = 0.0;
            max_lat = 0.0;
        }

        let width_zoom = if (max_lon - min_lon).abs() < EPSILON {
            None
        } else {
            Some((width - 2.0 * padding) / (max_lon - min_lon))
        };
        let height_zoom = if (max_lat - min_lat).abs() < EPSILON {
            None
        } else {
            Some((height - 2.0 * padding) / (max_lat - min_lat))
        };

        let zoom = match (width_zoom, height_zoom) {
            (Some(w), Some(h)) => w.min(h),
            (Some(w), None) => w,
            (None, Some(h)) => h,
            (None, None) => 0.0,
        };

        Projector {
            min_lon,
            max_lat,
            zoom,
            padding,
        }
    }

    fn project(&self, coords: Coordinates) -> (f64, f64) {
        let x = (coords.lon - self.min_lon) * self.zoom + self.padding;
        let y = (self.max_lat - coords.lat) * self.zoom + self.padding;
        (x, y)
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_label(
    out: &mut String,
    x: f64,
    y: f64,
    text: &str,
    settings: &RenderSettings,
    font_size: u32,
    offset: (f64, f64),
    fill: &str,
    bold: bool,
) {
    let weight = if bold { " font-weight=\"bold\"" } else { "" };
    let escaped = escape_xml(text);
    let _ = writeln!(
        out,
        "<text fill=\"{underlayer}\" stroke=\"{underlayer}\" stroke-width=\"{uw}\" stroke-linecap=\"round\" stroke-linejoin=\"round\" x=\"{x}\" y=\"{y}\" dx=\"{dx}\" dy=\"{dy}\" font-size=\"{fs}\" font-family=\"Verdana\"{weight}>{text}</text>",
        underlayer = settings.underlayer_color.to_svg(),
        uw = settings.underlayer_width,
        dx = offset.0,
        dy = offset.1,
        fs = font_size,
        weight = weight,
        text = escaped,
    );
    let _ = writeln!(
        out,
        "<text fill=\"{fill}\" x=\"{x}\" y=\"{y}\" dx=\"{dx}\" dy=\"{dy}\" font-size=\"{fs}\" font-family=\"Verdana\"{weight}>{text}</text>",
        fill = fill,
        dx = offset.0,
        dy = offset.1,
        fs = font_size,
        weight = weight,
        text = escaped,
    );
}

/// Produces the SVG document text for the `Map` stat request.
pub fn render_map(catalogue: &Catalogue, settings: &RenderSettings) -> String {
    let projector = Projector::new(
        &catalogue.non_empty_stop_coords(),
        settings.width,
        settings.height,
        settings.padding,
    );
    let buses = catalogue.non_empty_buses();
    let stops = catalogue.non_empty_stops();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{}\" height=\"{}\">",
        settings.width, settings.height
    );

    // Route polylines, one color per bus, cycling through the palette in
    // bus-name lexicographic order.
    for (i, bus) in buses.iter().enumerate() {
        let traversal = catalogue.materialized_traversal(bus);
        if traversal.len() < 2 {
            continue;
        }
        let color = settings
            .color_palette
            .get(i % settings.color_palette.len().max(1))
            .map(Color::to_svg)
            .unwrap_or_else(|| "none".to_string());
        let points: Vec<String> = traversal
            .iter()
            .map(|&id| {
                let (x, y) = projector.project(catalogue.stop_coords(id));
                format!("{x},{y}")
            })
            .collect();
        let _ = writeln!(
            out,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            points.join(" "),
            color,
            settings.line_width,
        );
    }

    // Bus name labels at the first stop, and the last stop if it differs.
    for (i, bus) in buses.iter().enumerate() {
        if bus.stops.is_empty() {
            continue;
        }
        let color = settings
            .color_palette
            .get(i % settings.color_palette.len().max(1))
            .map(Color::to_svg)
            .unwrap_or_else(|| "none".to_string());
        let first = bus.stops[0];
        let last = *bus.stops.last().unwrap();
        let (x, y) = projector.project(catalogue.stop_coords(first));
        write_label(
            &mut out,
            x,
            y,
            &bus.name,
            settings,
            settings.bus_label_font_size,
            settings.bus_label_offset,
            &color,
            true,
        );
        if !bus.is_roundtrip && catalogue.stop_coords(last) != catalogue.stop_coords(first) {
            let (x, y) = projector.project(catalogue.stop_coords(last));
            write_label(
                &mut out,
                x,
                y,
                &bus.name,
                settings,
                settings.bus_label_font_size,
                settings.bus_label_offset,
                &color,
                true,
            );
        }
    }

    // Stop markers: white circles, lexicographic order.
    for name in &stops {
        let id = catalogue.find_stop_id(name).expect("non_empty_stops returns known stops");
        let (x, y) = projector.project(catalogue.stop_coords(id));
        let _ = writeln!(
            out,
            "<circle cx=\"{x}\" cy=\"{y}\" r=\"{r}\" fill=\"white\"/>",
            r = settings.stop_radius,
        );
    }

    // Stop name labels, same order.
    for name in &stops {
        let id = catalogue.find_stop_id(name).expect("non_empty_stops returns known stops");
        let (x, y) = projector.project(catalogue.stop_coords(id));
        write_label(
            &mut out,
            x,
            y,
            name,
            settings,
            settings.stop_label_font_size,
            settings.stop_label_offset,
            "black",
            false,
        );
    }

    out.push_str("</svg>");
    out
}
