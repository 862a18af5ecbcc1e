use geo_types::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position in (latitude, longitude) order.
///
/// Geometry crates and KML use (x = longitude, y = latitude); conversions to
/// and from [`Coord`] perform the swap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> LatLng {
        LatLng { lat, lng }
    }

    /// Formats the position as `lng,lat`, the tuple order of KML coordinates.
    pub fn to_lng_lat(&self) -> String {
        format!("{},{}", self.lng, self.lat)
    }
}

/// `lat,lng`, the form directions services accept as origin or destination.
impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl From<Coord<f64>> for LatLng {
    fn from(c: Coord<f64>) -> Self {
        LatLng { lat: c.y, lng: c.x }
    }
}

impl From<LatLng> for Coord<f64> {
    fn from(p: LatLng) -> Self {
        Coord { x: p.lng, y: p.lat }
    }
}

/// Normalizes a stop name into its join key.
///
/// Follows title-case rules where a letter is upper-cased when it follows a
/// non-letter and lower-cased otherwise, so `"o'connell st."` becomes
/// `"O'Connell St."` and `"1st ave"` becomes `"1St Ave"`. Surrounding
/// whitespace is trimmed.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut previous_is_letter = false;
    for c in name.trim().chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}

/// Parses a coordinate cell. Blank cells and non-finite values yield `None`.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
