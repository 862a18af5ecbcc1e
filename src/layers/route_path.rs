use std::time::Instant;

use crate::directions::client::{DirectionsClient, Transport};
use crate::report::Warning;

use super::geo_util::LatLng;
use super::route_join::JoinedRoute;

/// Road-following path between two consecutive stops.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub from: String,
    pub to: String,
    /// Points in the order the directions service returned them; empty when
    /// the segment could not be resolved
    pub points: Vec<LatLng>,
}

// Layer 3 - Resolved geometry of a route, one segment per stop pair
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    pub route: String,
    pub segments: Vec<PathSegment>,
}

impl RoutePath {
    /// Resolve every consecutive stop pair of a route
    ///
    /// # Parameters
    /// - `route`: The joined route
    /// - `client`: Directions client used for each pair
    /// - `warnings`: Receives a warning for every pair left empty
    ///
    /// # Returns
    /// One segment per pair, in travel order
    ///
    /// Pairs are requested one after the other. A pair with an unresolved
    /// stop is not requested. A failed request leaves its segment empty and
    /// the remaining pairs are still resolved.
    pub async fn resolve<T: Transport>(
        route: &JoinedRoute,
        client: &DirectionsClient<T>,
        warnings: &mut Vec<Warning>,
    ) -> RoutePath {
        let start = Instant::now();
        let mut segments = Vec::with_capacity(route.stops.len().saturating_sub(1));
        for (from, to) in route.pairs() {
            let points = match (from.position.lat_lng(), to.position.lat_lng()) {
                (Some(origin), Some(destination)) => {
                    match client.resolve_segment(origin, destination).await {
                        Ok(points) => points,
                        Err(e) => {
                            log::warn!(
                                "Route {}: directions {} -> {} failed: {}",
                                route.name,
                                from.name,
                                to.name,
                                e
                            );
                            warnings.push(Warning::SegmentFailed {
                                route: route.name.clone(),
                                from: from.name.clone(),
                                to: to.name.clone(),
                                reason: e.to_string(),
                            });
                            Vec::new()
                        }
                    }
                }
                _ => {
                    log::warn!(
                        "Route {}: skipping {} -> {}, missing coordinates",
                        route.name,
                        from.name,
                        to.name
                    );
                    warnings.push(Warning::UnresolvedPair {
                        route: route.name.clone(),
                        from: from.name.clone(),
                        to: to.name.clone(),
                    });
                    Vec::new()
                }
            };
            segments.push(PathSegment {
                from: from.name.clone(),
                to: to.name.clone(),
                points,
            });
        }
        log::debug!(
            "Route {} resolved {} segments in {}ms",
            route.name,
            segments.len(),
            start.elapsed().as_millis()
        );
        RoutePath {
            route: route.name.clone(),
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::client::tests::{route_body, ScriptedTransport};
    use crate::directions::error::Error as DirectionsError;
    use crate::directions::DEFAULT_DIRECTIONS_URL;
    use crate::layers::route_join::{RouteStop, StopPosition};

    fn stop(name: &str, position: Option<(f64, f64)>) -> RouteStop {
        RouteStop {
            name: name.to_string(),
            position: match position {
                Some((lat, lng)) => StopPosition::Resolved(LatLng::new(lat, lng)),
                None => StopPosition::Unresolved,
            },
        }
    }

    #[actix_rt::test]
    async fn failed_pair_is_left_empty_and_reported() {
        let route = JoinedRoute {
            name: "R1".to_string(),
            stops: vec![
                stop("A", Some((1.0, 1.0))),
                stop("B", Some((2.0, 2.0))),
                stop("C", Some((3.0, 3.0))),
            ],
        };
        let transport = ScriptedTransport::new(vec![
            Err(DirectionsError::Transport("connection refused".to_string())),
            Ok(route_body(&[LatLng::new(2.0, 2.0), LatLng::new(3.0, 3.0)])),
        ]);
        let client = DirectionsClient::new(transport, DEFAULT_DIRECTIONS_URL, "key").unwrap();
        let mut warnings = Vec::new();

        let path = RoutePath::resolve(&route, &client, &mut warnings).await;

        assert_eq!(path.segments.len(), 2);
        assert!(path.segments[0].points.is_empty());
        assert_eq!(path.segments[1].points.len(), 2);
        assert_eq!(
            warnings,
            vec![Warning::SegmentFailed {
                route: "R1".to_string(),
                from: "A".to_string(),
                to: "B".to_string(),
                reason: "transport failure: connection refused".to_string(),
            }]
        );
    }

    #[actix_rt::test]
    async fn unresolved_stops_are_never_requested() {
        let route = JoinedRoute {
            name: "R1".to_string(),
            stops: vec![
                stop("A", Some((1.0, 1.0))),
                stop("Nowhere", None),
                stop("C", Some((3.0, 3.0))),
            ],
        };
        let client =
            DirectionsClient::new(ScriptedTransport::default(), DEFAULT_DIRECTIONS_URL, "key")
                .unwrap();
        let mut warnings = Vec::new();

        let path = RoutePath::resolve(&route, &client, &mut warnings).await;

        assert!(path.segments.iter().all(|s| s.points.is_empty()));
        assert_eq!(warnings.len(), 2);
        assert!(matches!(&warnings[1], Warning::UnresolvedPair { from, .. } if from == "Nowhere"));
    }

    #[actix_rt::test]
    async fn single_stop_route_has_no_segments() {
        let route = JoinedRoute {
            name: "Loop".to_string(),
            stops: vec![stop("A", Some((1.0, 1.0)))],
        };
        let client =
            DirectionsClient::new(ScriptedTransport::default(), DEFAULT_DIRECTIONS_URL, "key")
                .unwrap();
        let path = RoutePath::resolve(&route, &client, &mut Vec::new()).await;
        assert!(path.segments.is_empty());
    }
}
