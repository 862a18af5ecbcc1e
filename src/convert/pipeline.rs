use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::directions::client::{DirectionsClient, Transport};
use crate::kml::document::KmlDocument;
use crate::layers::route_join::{join_workbook, merged_workbook, JoinedRoute};
use crate::layers::route_path::RoutePath;
use crate::layers::stop_registry::StopRegistry;
use crate::report::Warning;
use crate::sheets::workbook::{unique_file_name, Workbook};

use super::error::Error;
use super::package::package;
use super::request::{ConversionOptions, ConversionRequest, Layout, Workspace};

pub const COMBINED_FILE_STEM: &str = "bus_route_polyline";
const MERGED_WORKBOOK_NAME: &str = "merged_route";

/// Routes joined against the stop registry, before any directions request.
#[derive(Debug)]
pub struct MergeOutput {
    pub registry: StopRegistry,
    pub routes: Vec<JoinedRoute>,
    pub warnings: Vec<Warning>,
}

impl MergeOutput {
    pub fn workbook(&self) -> Workbook {
        merged_workbook(MERGED_WORKBOOK_NAME, &self.routes)
    }
}

/// Result of a conversion.
#[derive(Debug)]
pub struct ConversionOutput {
    /// File to hand back: the single KML or a zip of all of them
    pub artifact: PathBuf,
    /// Every KML file written, in route order
    pub files: Vec<PathBuf>,
    /// Merged route sheets written before any directions request
    pub merged: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
    pub routes: usize,
    pub placemarks: usize,
}

impl ConversionOutput {
    pub fn print_stats(&self) {
        println!("Conversion output:");
        println!("  Routes: {}", self.routes);
        println!("  Placemarks: {}", self.placemarks);
        println!("  Files: {}", self.files.len());
        println!("  Warnings: {}", self.warnings.len());
        println!("  Artifact: {}", self.artifact.display());
    }
}

/// Join every route sheet against the stop registry
///
/// # Parameters
/// - `stops`: Workbook whose first sheet is the stop registry
/// - `routes`: Workbook with one route per sheet
///
/// # Returns
/// The joined routes and the warnings raised while joining, or an error when
/// a required column is missing or there is no route sheet
pub fn merge(stops: &Workbook, routes: &Workbook) -> Result<MergeOutput, Error> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let registry = StopRegistry::from_table(stops.first_sheet()?, &mut warnings)?;
    if routes.sheets.is_empty() {
        return Err(Error::NoRoutes);
    }
    let joined = join_workbook(routes, &registry, &mut warnings)?;
    log::debug!(
        "Joined {} routes against {} stops in {}ms",
        joined.len(),
        registry.len(),
        start.elapsed().as_millis()
    );
    Ok(MergeOutput {
        registry,
        routes: joined,
        warnings,
    })
}

/// Run a full conversion
///
/// # Parameters
/// - `request`: Input files, API key and options
/// - `transport`: HTTP layer for the directions client
/// - `workspace`: Directory owned by this request
///
/// # Returns
/// The packaged output and every warning raised on the way
///
/// Stops on missing columns or unreadable inputs. Directions failures only
/// leave the affected pair out of the output.
pub async fn convert<T: Transport>(
    request: &ConversionRequest,
    transport: T,
    workspace: &Workspace,
) -> Result<ConversionOutput, Error> {
    let start = Instant::now();
    log::info!("Conversion {} started", request.id);
    let client = client_for(transport, &request.api_key, &request.options)?;

    let stops = read_input(&request.stops_file, request.stops_upload_name.as_deref())?;
    let routes = read_input(&request.routes_file, request.routes_upload_name.as_deref())?;
    let merged = merge(&stops, &routes)?;
    let merged_files = merged.workbook().write_csv_dir(workspace.merged_dir())?;

    let mut output = write_paths(
        &merged.routes,
        merged.warnings,
        &request.options,
        &client,
        &workspace.output_dir(),
    )
    .await?;
    output.merged = merged_files;
    log::info!(
        "Conversion {} finished in {}ms with {} warnings",
        request.id,
        start.elapsed().as_millis(),
        output.warnings.len()
    );
    Ok(output)
}

/// Run the path stage on routes that were merged earlier
///
/// # Parameters
/// - `merged`: Workbook of merged sheets (`Bus Stop`, `center_lat`, `center_lon`)
/// - `api_key`: Directions service credential
/// - `options`: Output options
/// - `transport`: HTTP layer for the directions client
/// - `workspace`: Directory owned by this request
pub async fn convert_merged<T: Transport>(
    merged: &Workbook,
    api_key: &str,
    options: &ConversionOptions,
    transport: T,
    workspace: &Workspace,
) -> Result<ConversionOutput, Error> {
    let client = client_for(transport, api_key, options)?;
    if merged.sheets.is_empty() {
        return Err(Error::NoRoutes);
    }
    let routes = merged
        .sheets
        .iter()
        .map(JoinedRoute::from_merged_table)
        .collect::<Result<Vec<JoinedRoute>, _>>()?;
    write_paths(
        &routes,
        Vec::new(),
        options,
        &client,
        &workspace.output_dir(),
    )
    .await
}

fn read_input(path: &Path, upload_name: Option<&str>) -> Result<Workbook, Error> {
    let workbook = match upload_name {
        Some(name) => Workbook::from_upload(path, name)?,
        None => Workbook::from_path(path)?,
    };
    Ok(workbook)
}

fn client_for<T: Transport>(
    transport: T,
    api_key: &str,
    options: &ConversionOptions,
) -> Result<DirectionsClient<T>, Error> {
    if api_key.trim().is_empty() {
        return Err(Error::Error("A directions API key is required".to_string()));
    }
    Ok(DirectionsClient::new(
        transport,
        &options.directions_url,
        api_key.trim(),
    )?)
}

async fn write_paths<T: Transport>(
    routes: &[JoinedRoute],
    mut warnings: Vec<Warning>,
    options: &ConversionOptions,
    client: &DirectionsClient<T>,
    output_dir: &Path,
) -> Result<ConversionOutput, Error> {
    let mut files = Vec::new();
    let mut placemarks = 0;
    let mut used_names = HashSet::new();

    match options.layout {
        Layout::PerRoute => {
            for route in routes {
                let path = RoutePath::resolve(route, client, &mut warnings).await;
                let doc = KmlDocument::for_route(&path, options.geometry, options.style.clone());
                placemarks += doc.placemark_count();
                let file = output_dir.join(unique_file_name(&route.name, "kml", &mut used_names));
                doc.write_to(&file)?;
                log::debug!("Wrote {}", file.display());
                files.push(file);
            }
        }
        Layout::Combined => {
            let mut doc = KmlDocument::new(COMBINED_FILE_STEM, options.style.clone());
            for route in routes {
                let path = RoutePath::resolve(route, client, &mut warnings).await;
                doc.add_route_folder(&path, options.geometry);
            }
            placemarks = doc.placemark_count();
            let file = output_dir.join(format!("{}.kml", COMBINED_FILE_STEM));
            doc.write_to(&file)?;
            log::debug!("Wrote {}", file.display());
            files.push(file);
        }
    }

    let artifact = package(&files, output_dir)?;
    Ok(ConversionOutput {
        artifact,
        files,
        merged: Vec::new(),
        warnings,
        routes: routes.len(),
        placemarks,
    })
}
