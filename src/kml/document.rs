use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::layers::geo_util::LatLng;
use crate::layers::route_path::RoutePath;

/// How the coordinates of each stop-pair placemark are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Geometry {
    /// Each placemark holds only its own pair's segment
    #[default]
    Segment,
    /// Each placemark holds every point resolved so far along the route
    Cumulative,
}

impl FromStr for Geometry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "segment" => Ok(Geometry::Segment),
            "cumulative" => Ok(Geometry::Cumulative),
            other => Err(format!(
                "unknown geometry '{}', expected 'segment' or 'cumulative'",
                other
            )),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Segment => write!(f, "segment"),
            Geometry::Cumulative => write!(f, "cumulative"),
        }
    }
}

/// Line appearance shared by every placemark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// KML colour, `aabbggrr` hex
    pub color: String,
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        LineStyle {
            color: "ffff0000".to_string(),
            width: 5.0,
        }
    }
}

/// A named line.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub coordinates: Vec<LatLng>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub name: String,
    pub placemarks: Vec<Placemark>,
}

/// A KML document holding loose placemarks and folders of placemarks.
#[derive(Debug, Clone, PartialEq)]
pub struct KmlDocument {
    pub name: String,
    pub style: LineStyle,
    pub placemarks: Vec<Placemark>,
    pub folders: Vec<Folder>,
}

impl KmlDocument {
    pub fn new(name: &str, style: LineStyle) -> KmlDocument {
        KmlDocument {
            name: name.to_string(),
            style,
            placemarks: Vec::new(),
            folders: Vec::new(),
        }
    }

    /// Document for a single route, placemarks at the top level.
    pub fn for_route(path: &RoutePath, geometry: Geometry, style: LineStyle) -> KmlDocument {
        let mut doc = KmlDocument::new(&path.route, style);
        doc.placemarks = placemarks_for(path, geometry);
        doc
    }

    /// Adds a route as its own folder.
    pub fn add_route_folder(&mut self, path: &RoutePath, geometry: Geometry) {
        self.folders.push(Folder {
            name: path.route.clone(),
            placemarks: placemarks_for(path, geometry),
        });
    }

    pub fn placemark_count(&self) -> usize {
        self.placemarks.len()
            + self
                .folders
                .iter()
                .map(|f| f.placemarks.len())
                .sum::<usize>()
    }
}

pub fn placemark_name(from: &str, to: &str) -> String {
    format!("Route from {} to {}", from, to)
}

/// Builds the placemarks of a route.
///
/// With `Geometry::Segment` every non-empty segment becomes a placemark with
/// its own points. With `Geometry::Cumulative` the points of every segment
/// are appended to a running list, and each pair from the first resolved
/// point onwards gets a placemark carrying the whole list.
pub fn placemarks_for(path: &RoutePath, geometry: Geometry) -> Vec<Placemark> {
    match geometry {
        Geometry::Segment => path
            .segments
            .iter()
            .filter(|s| !s.points.is_empty())
            .map(|s| Placemark {
                name: placemark_name(&s.from, &s.to),
                coordinates: s.points.clone(),
            })
            .collect(),
        Geometry::Cumulative => {
            let mut running: Vec<LatLng> = Vec::new();
            let mut placemarks = Vec::new();
            for s in &path.segments {
                running.extend_from_slice(&s.points);
                if !running.is_empty() {
                    placemarks.push(Placemark {
                        name: placemark_name(&s.from, &s.to),
                        coordinates: running.clone(),
                    });
                }
            }
            placemarks
        }
    }
}
