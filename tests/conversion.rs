use std::cell::RefCell;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use url::Url;

use bus_route_kml::convert::{
    self, ConversionOptions, ConversionRequest, Layout, Workspace,
};
use bus_route_kml::directions::{Error as DirectionsError, Transport};
use bus_route_kml::report::Warning;
use bus_route_kml::sheets::{Table, Workbook};

/// Answers every request with a straight line from origin to destination,
/// except requests leaving `failing_origin`, which get an HTTP 500.
#[derive(Clone, Default)]
struct StraightLineTransport {
    failing_origin: Option<String>,
    requested: Rc<RefCell<Vec<Url>>>,
}

fn query_point(url: &Url, key: &str) -> Option<(f64, f64)> {
    let value = url.query_pairs().find(|(k, _)| k == key)?.1.into_owned();
    let (lat, lng) = value.split_once(',')?;
    Some((lat.parse().ok()?, lng.parse().ok()?))
}

impl Transport for StraightLineTransport {
    fn get<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<Vec<u8>, DirectionsError>> {
        self.requested.borrow_mut().push(url.clone());
        let origin_text = url
            .query_pairs()
            .find(|(k, _)| k == "origin")
            .map(|(_, v)| v.into_owned());
        let reply = if origin_text.is_some() && origin_text == self.failing_origin {
            Err(DirectionsError::Status {
                status: 500,
                body: "backend unavailable".to_string(),
            })
        } else {
            match (query_point(url, "origin"), query_point(url, "destination")) {
                (Some((lat1, lng1)), Some((lat2, lng2))) => {
                    let line = vec![
                        geo_types::Coord { x: lng1, y: lat1 },
                        geo_types::Coord { x: lng2, y: lat2 },
                    ];
                    let encoded = polyline::encode_coordinates(line, 5).unwrap();
                    Ok(serde_json::to_vec(&serde_json::json!({
                        "routes": [{"overview_polyline": {"points": encoded}}],
                        "status": "OK"
                    }))
                    .unwrap())
                }
                _ => Err(DirectionsError::Transport("bad query".to_string())),
            }
        };
        futures::future::ready(reply).boxed_local()
    }
}

fn write_fixtures(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let stops = dir.join("stops.csv");
    std::fs::write(
        &stops,
        "Bus Stop,center_lat,center_lon\n\
         Main Gate,12.5,77.25\n\
         Market,12.75,77.5\n\
         Depot,13,78\n\
         depot,40,40\n\
         Library,,77.0\n",
    )
    .unwrap();

    let routes = dir.join("routes");
    std::fs::create_dir(&routes).unwrap();
    std::fs::write(
        routes.join("North.csv"),
        "Bus Stop\nmain gate\nMarket\n MARKET \nDepot\n",
    )
    .unwrap();
    std::fs::write(
        routes.join("South.csv"),
        "Bus Stop\nDepot\nunknown stop\nMarket\n",
    )
    .unwrap();
    (stops, routes)
}

fn zipped_file(archive: &Path, name: &str) -> String {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut content = String::new();
    zip.by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[actix_rt::test]
async fn converts_each_route_to_its_own_kml_and_bundles_them() {
    let dir = tempfile::tempdir().unwrap();
    let (stops, routes) = write_fixtures(dir.path());
    let workspace = Workspace::create(dir.path().join("work"), uuid::Uuid::new_v4()).unwrap();

    let transport = StraightLineTransport {
        failing_origin: Some("12.75,77.5".to_string()),
        ..StraightLineTransport::default()
    };
    let requested = transport.requested.clone();
    let request = ConversionRequest::new(&stops, &routes, "test-key");
    let output = convert::convert(&request, transport, &workspace)
        .await
        .unwrap();

    // North: Main Gate -> Market -> Depot. South has no resolvable pair.
    assert_eq!(requested.borrow().len(), 2);
    assert!(requested
        .borrow()
        .iter()
        .all(|u| u.query_pairs().any(|(k, v)| k == "key" && v == "test-key")));

    assert_eq!(output.routes, 2);
    assert_eq!(output.placemarks, 1);
    assert_eq!(output.files.len(), 2);
    assert_eq!(output.merged.len(), 2);
    assert_eq!(
        output.artifact.file_name().unwrap().to_string_lossy(),
        "bus_routes.zip"
    );

    let north = zipped_file(&output.artifact, "North.kml");
    assert!(north.contains("<name>Route from Main Gate to Market</name>"));
    assert!(north.contains("77.25,12.5 77.5,12.75"));
    assert!(!north.contains("Route from Market to Depot"));

    let south = zipped_file(&output.artifact, "South.kml");
    assert!(!south.contains("<Placemark>"));

    let warnings = &output.warnings;
    assert!(warnings.contains(&Warning::DuplicateStop {
        stop: "Depot".to_string(),
        row: 5,
    }));
    assert!(warnings.contains(&Warning::MissingCoordinates {
        table: "stops".to_string(),
        stop: "Library".to_string(),
        row: 6,
    }));
    assert!(warnings.contains(&Warning::UnmatchedStop {
        route: "South".to_string(),
        stop: "Unknown Stop".to_string(),
    }));
    assert!(warnings.iter().any(|w| matches!(
        w,
        Warning::SegmentFailed { route, from, to, .. }
            if route == "North" && from == "Market" && to == "Depot"
    )));
}

#[actix_rt::test]
async fn combined_layout_is_a_single_unzipped_file() {
    let dir = tempfile::tempdir().unwrap();
    let (stops, routes) = write_fixtures(dir.path());
    let workspace = Workspace::at(dir.path().join("out")).unwrap();

    let options = ConversionOptions {
        layout: Layout::Combined,
        ..ConversionOptions::default()
    };
    let request = ConversionRequest::new(&stops, &routes, "test-key").with_options(options);
    let output = convert::convert(&request, StraightLineTransport::default(), &workspace)
        .await
        .unwrap();

    assert_eq!(output.files.len(), 1);
    assert_eq!(output.artifact, output.files[0]);
    let kml = std::fs::read_to_string(&output.artifact).unwrap();
    assert!(kml.contains("<name>North</name>"));
    assert!(kml.contains("<name>South</name>"));
    assert!(kml.contains("<name>Route from Market to Depot</name>"));
    assert_eq!(output.placemarks, 2);
}

#[actix_rt::test]
async fn merged_sheets_without_coordinates_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::at(dir.path()).unwrap();
    let merged = Workbook {
        name: "merged_route".to_string(),
        sheets: vec![Table::new(
            "North",
            vec!["Bus Stop".to_string(), "center_lon".to_string()],
            vec![vec!["Main Gate".to_string(), "77.25".to_string()]],
        )],
    };

    let transport = StraightLineTransport::default();
    let requested = transport.requested.clone();
    let err = convert::convert_merged(
        &merged,
        "test-key",
        &ConversionOptions::default(),
        transport,
        &workspace,
    )
    .await
    .unwrap_err();
    assert!(err.is_missing_column());
    assert!(err.to_string().contains("'center_lat'"));
    assert!(requested.borrow().is_empty());
}

#[actix_rt::test]
async fn blank_api_key_stops_before_reading_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::at(dir.path()).unwrap();
    let request = ConversionRequest::new(dir.path().join("missing.xlsx"), dir.path(), "  ");
    let err = convert::convert(&request, StraightLineTransport::default(), &workspace)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("API key"));
}
