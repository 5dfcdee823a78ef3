//! Great-circle distance between two points on the Earth's surface.

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinates { lat, lon }
    }
}

/// Great-circle distance in meters, via the spherical law of cosines.
///
/// Ported from the reference `geo.cpp` formula so results stay bit-identical
/// to the original implementation within 1 ulp.
pub fn great_circle_meters(from: Coordinates, to: Coordinates) -> f64 {
    if from == to {
        return 0.0;
    }
    let dr = std::f64::consts::PI / 180.0;
    let cos_angle = (from.lat * dr).sin() * (to.lat * dr).sin()
        + (from.lat * dr).cos() * (to.lat * dr).cos() * ((from.lon - to.lon).abs() * dr).cos();
    cos_angle.acos() * EARTH_RADIUS_METERS
}
