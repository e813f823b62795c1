//! Geographic utilities: the haversine metric and coordinate arithmetic.

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// Earth radius in kilometers used by the distance metric.
pub const EARTH_RADIUS_KM: f64 = 6373.0;

/// How the distance metric treats the sign of each component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    /// Absolute values of both components are used, so the metric cannot
    /// tell north from south or east from west. Output-compatible default.
    #[default]
    HemisphereBlind,
    /// Signs are kept.
    Signed,
}

impl DistanceMode {
    /// Map a coordinate into the space the metric actually measures.
    #[inline]
    pub fn project(self, c: Coordinate) -> Coordinate {
        match self {
            DistanceMode::HemisphereBlind => Coordinate::new(c.x.abs(), c.y.abs()),
            DistanceMode::Signed => c,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMode::HemisphereBlind => "hemisphere_blind",
            DistanceMode::Signed => "signed",
        }
    }
}

/// Great-circle distance in kilometers between two coordinates.
///
/// `x` is the longitude, `y` the latitude. The haversine term is clamped to
/// `[0, 1]` so nonsensical inputs (latitudes beyond ±90) still give a number.
///
/// # Example
/// ```
/// use geoanchor::{Coordinate, DistanceMode, haversine_distance};
/// let a = Coordinate::new(-77.037852, 38.898556);
/// let b = Coordinate::new(-77.043934, 38.897147);
/// let d = haversine_distance(&a, &b, DistanceMode::HemisphereBlind);
/// assert!((d - 0.549).abs() < 0.0005);
/// ```
pub fn haversine_distance(a: &Coordinate, b: &Coordinate, mode: DistanceMode) -> f64 {
    let a = mode.project(*a);
    let b = mode.project(*b);

    let lon1 = a.x.to_radians();
    let lon2 = b.x.to_radians();
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();

    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Latitude band (degrees) outside of which no point can be within
/// `radius_km`. Haversine distance is never below `R * |dlat|`.
pub fn latitude_band_degrees(radius_km: f64) -> f64 {
    (radius_km / EARTH_RADIUS_KM).to_degrees()
}

/// Round to `decimals` places using the exact decimal expansion of the value,
/// so ties are decided the same way `format!("{:.N}")` decides them.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Arithmetic mean of each component, summed in iteration order.
///
/// If a running sum overflows, that component is recomputed as a running
/// mean so finite inputs always give a finite result.
///
/// Returns `None` for an empty input.
pub fn mean<'a, I>(coords: I) -> Option<Coordinate>
where
    I: IntoIterator<Item = &'a Coordinate> + Clone,
{
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut count = 0usize;
    for c in coords.clone() {
        sum_x += c.x;
        sum_y += c.y;
        count += 1;
    }
    if count == 0 {
        return None;
    }

    let mut x = sum_x / count as f64;
    let mut y = sum_y / count as f64;
    if !x.is_finite() {
        x = running_mean(coords.clone().into_iter().map(|c| c.x));
    }
    if !y.is_finite() {
        y = running_mean(coords.into_iter().map(|c| c.y));
    }
    Some(Coordinate::new(x, y))
}

fn running_mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut m = 0.0;
    for (i, v) in values.enumerate() {
        m += (v - m) / (i + 1) as f64;
    }
    m
}

/// Mean rounded to `decimals` places per component.
pub fn rounded_mean<'a, I>(coords: I, decimals: u32) -> Option<Coordinate>
where
    I: IntoIterator<Item = &'a Coordinate> + Clone,
{
    mean(coords).map(|m| Coordinate::new(round_to(m.x, decimals), round_to(m.y, decimals)))
}
