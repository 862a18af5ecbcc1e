use futures::future::{FutureExt, LocalBoxFuture};
use url::Url;

use crate::layers::geo_util::LatLng;

use super::error::Error;
use super::polyline;
use super::response::DirectionsResponse;

pub const DEFAULT_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

// Responses are a few kilobytes; long routes stay well below this
const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

/// HTTP layer of the directions client.
///
/// Implementations perform a GET and hand back the body of a successful
/// response. Failures to connect, non-success statuses and unreadable bodies
/// are errors.
pub trait Transport {
    fn get<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<Vec<u8>, Error>>;
}

/// Transport backed by an `awc` client. Must be used from an actix runtime.
pub struct AwcTransport {
    client: awc::Client,
}

impl AwcTransport {
    pub fn new() -> Self {
        install_crypto_provider();
        AwcTransport {
            client: awc::Client::default(),
        }
    }
}

/// Selects `ring` as the process-wide rustls provider used by the HTTPS
/// connector. Safe to call more than once.
pub fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Err only when another thread installed a provider first
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}

impl Default for AwcTransport {
    fn default() -> Self {
        AwcTransport::new()
    }
}

impl Transport for AwcTransport {
    fn get<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<Vec<u8>, Error>> {
        async move {
            let mut res = self
                .client
                .get(url.as_str())
                .send()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;
            let status = res.status();
            let body = res
                .body()
                .limit(MAX_RESPONSE_BYTES)
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;
            if !status.is_success() {
                return Err(Error::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            Ok(body.to_vec())
        }
        .boxed_local()
    }
}

/// Client for a directions service returning encoded route polylines.
pub struct DirectionsClient<T: Transport = AwcTransport> {
    transport: T,
    endpoint: Url,
    api_key: String,
}

impl DirectionsClient<AwcTransport> {
    pub fn with_awc(endpoint: &str, api_key: &str) -> Result<Self, Error> {
        DirectionsClient::new(AwcTransport::new(), endpoint, api_key)
    }
}

impl<T: Transport> DirectionsClient<T> {
    pub fn new(transport: T, endpoint: &str, api_key: &str) -> Result<Self, Error> {
        Ok(DirectionsClient {
            transport,
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.to_string(),
        })
    }

    /// Builds `<endpoint>?origin=<lat,lng>&destination=<lat,lng>&key=<api key>`.
    pub fn request_url(&self, origin: LatLng, destination: LatLng) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("origin", &origin.to_string())
            .append_pair("destination", &destination.to_string())
            .append_pair("key", &self.api_key);
        url
    }

    /// Resolve the road-following path between two points
    ///
    /// # Parameters
    /// - `origin`: Start of the segment
    /// - `destination`: End of the segment
    ///
    /// # Returns
    /// The decoded points of the first route returned, in (lat, lng) order
    ///
    /// Every failure is returned as an error; nothing is retried.
    pub async fn resolve_segment(
        &self,
        origin: LatLng,
        destination: LatLng,
    ) -> Result<Vec<LatLng>, Error> {
        let url = self.request_url(origin, destination);
        log::debug!("Requesting directions {} -> {}", origin, destination);
        let body = self.transport.get(&url).await?;
        let response: DirectionsResponse = serde_json::from_slice(&body)?;
        match response.first_polyline() {
            Some(points) => polyline::decode(points),
            None => Err(Error::NoRoute {
                status: response.status.unwrap_or_else(|| "UNKNOWN".to_string()),
                message: response.error_message,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned results in order and records the URLs requested.
    #[derive(Default)]
    pub struct ScriptedTransport {
        pub replies: RefCell<VecDeque<Result<Vec<u8>, Error>>>,
        pub requested: RefCell<Vec<Url>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Result<Vec<u8>, Error>>) -> Self {
            ScriptedTransport {
                replies: RefCell::new(replies.into()),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn get<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<Vec<u8>, Error>> {
            self.requested.borrow_mut().push(url.clone());
            let reply = self
                .replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Transport("no scripted reply".to_string())));
            futures::future::ready(reply).boxed_local()
        }
    }

    /// A successful directions body whose single route passes through `points`.
    pub fn route_body(points: &[LatLng]) -> Vec<u8> {
        let line = points
            .iter()
            .map(|p| geo_types::Coord::from(*p))
            .collect::<geo_types::LineString<f64>>();
        let encoded = ::polyline::encode_coordinates(line, polyline::POLYLINE_PRECISION).unwrap();
        serde_json::to_vec(&serde_json::json!({
            "routes": [{"overview_polyline": {"points": encoded}}],
            "status": "OK"
        }))
        .unwrap()
    }

    #[test]
    fn builds_request_url() {
        let client = DirectionsClient::new(
            ScriptedTransport::default(),
            "https://example.test/directions/json",
            "k3y&x",
        )
        .unwrap();
        let url = client.request_url(LatLng::new(12.5, 77.25), LatLng::new(-1.0, 2.0));
        assert_eq!(
            url.as_str(),
            "https://example.test/directions/json?origin=12.5%2C77.25&destination=-1%2C2&key=k3y%26x"
        );
    }

    #[actix_rt::test]
    async fn builds_https_client() {
        let client = DirectionsClient::with_awc(DEFAULT_DIRECTIONS_URL, "k").unwrap();
        let url = client.request_url(LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0));
        assert_eq!(url.scheme(), "https");
        assert!(rustls::crypto::CryptoProvider::get_default().is_some());

        // A second transport reuses the installed provider
        let _again = AwcTransport::new();
    }

    #[test]
    fn rejects_bad_endpoint() {
        assert!(matches!(
            DirectionsClient::new(ScriptedTransport::default(), "not a url", "k"),
            Err(Error::Url(_))
        ));
    }

    #[actix_rt::test]
    async fn decodes_first_route() {
        let points = vec![LatLng::new(38.5, -120.2), LatLng::new(40.7, -120.95)];
        let transport = ScriptedTransport::new(vec![Ok(route_body(&points))]);
        let client = DirectionsClient::new(transport, DEFAULT_DIRECTIONS_URL, "key").unwrap();
        let resolved = client
            .resolve_segment(points[0], points[1])
            .await
            .unwrap();
        assert_eq!(resolved.len(), 2);
        for (got, want) in resolved.iter().zip(&points) {
            assert!((got.lat - want.lat).abs() < 1e-9 && (got.lng - want.lng).abs() < 1e-9);
        }
        assert_eq!(client.transport.requested.borrow().len(), 1);
    }

    #[actix_rt::test]
    async fn transport_failure_is_an_error() {
        let transport = ScriptedTransport::new(vec![Err(Error::Status {
            status: 500,
            body: "oops".to_string(),
        })]);
        let client = DirectionsClient::new(transport, DEFAULT_DIRECTIONS_URL, "key").unwrap();
        let err = client
            .resolve_segment(LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP status 500: oops");
    }

    #[actix_rt::test]
    async fn empty_routes_are_an_error() {
        let body = br#"{"routes": [], "status": "ZERO_RESULTS"}"#.to_vec();
        let client =
            DirectionsClient::new(ScriptedTransport::new(vec![Ok(body)]), DEFAULT_DIRECTIONS_URL, "key")
                .unwrap();
        let err = client
            .resolve_segment(LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no route returned (status ZERO_RESULTS)");
    }

    #[actix_rt::test]
    async fn malformed_body_is_an_error() {
        let client = DirectionsClient::new(
            ScriptedTransport::new(vec![Ok(b"<html>".to_vec())]),
            DEFAULT_DIRECTIONS_URL,
            "key",
        )
        .unwrap();
        assert!(matches!(
            client
                .resolve_segment(LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0))
                .await,
            Err(Error::Decode(_))
        ));
    }
}
