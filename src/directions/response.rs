use serde::Deserialize;

/// Subset of a directions service JSON response.
#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsRoute {
    pub overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
pub struct OverviewPolyline {
    /// Encoded polyline of the whole route
    pub points: String,
}

impl DirectionsResponse {
    /// Encoded geometry of the first route, if any.
    pub fn first_polyline(&self) -> Option<&str> {
        self.routes
            .first()
            .map(|r| r.overview_polyline.points.as_str())
    }
}
