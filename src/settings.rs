//! Settings that shape routing and rendering but never change the catalogue
//! data itself: routing speeds/wait times, and the renderer's SVG styling.

use serde::{Deserialize, Serialize};

/// A color as it appears in the request/response JSON and in the rendered
/// SVG: either a named SVG color or an explicit RGB/RGBA triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(String),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
}

impl Color {
    pub fn to_svg(&self) -> String {
        match self {
            Color::Named(name) => name.clone(),
            Color::Rgb(r, g, b) => format!("rgb({r},{g},{b})"),
            Color::Rgba(r, g, b, a) => format!("rgba({r},{g},{b},{a})"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: (f64, f64),
    pub stop_label_font_size: u32,
    pub stop_label_offset: (f64, f64),
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    pub color_palette: Vec<Color>,
}

impl RenderSettings {
    /// `padding` must leave room for the projected image to have positive
    /// extent on both axes.
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        let limit = self.width.min(self.height) / 2.0;
        if self.padding < 0.0 || self.padding >= limit {
            return Err(crate::error::Error::InvalidSettings(format!(
                "padding {} must be in [0, {})",
                self.padding, limit
            )));
        }
        Ok(())
    }
}

/// How long a bus waits at a stop, and how fast it travels, used to weight
/// the routing graph's wait and ride edges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoutingParameters {
    /// Minutes a bus waits at each stop before departing.
    pub bus_wait_time: u32,
    /// Kilometers per hour.
    pub bus_velocity: f64,
}

impl RoutingParameters {
    /// Meters traveled per minute, the unit ride-edge weights are computed in.
    pub fn meters_per_minute(&self) -> f64 {
        self.bus_velocity * 1000.0 / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meters_per_minute_conversion() {
        let params = RoutingParameters {
            bus_wait_time: 6,
            bus_velocity: 40.0,
        };
        assert!((params.meters_per_minute() - 666.666_66).abs() < 0.01);
    }

    #[test]
    fn color_svg_rendering() {
        assert_eq!(Color::Named("red".into()).to_svg(), "red");
        assert_eq!(Color::Rgb(255, 0, 0).to_svg(), "rgb(255,0,0)");
        assert_eq!(Color::Rgba(255, 0, 0, 0.5).to_svg(), "rgba(255,0,0,0.5)");
    }

    fn base_render_settings() -> RenderSettings {
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
    fn validate_accepts_padding_within_bounds() {
        assert!(base_render_settings().validate().is_ok());
    }

    #[test]
    fn validate_rejects_padding_at_or_past_half_the_smaller_dimension() {
        let mut settings = base_render_settings();
        settings.padding = 200.0; // height/2
        assert!(matches!(
            settings.validate(),
            Err(crate::error::Error::InvalidSettings(_))
        ));
    }

    #[test]
    fn validate_rejects_negative_padding() {
        let mut settings = base_render_settings();
        settings.padding = -1.0;
        assert!(settings.validate().is_err());
    }
}
