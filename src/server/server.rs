use crate::convert::{self, ConversionOptions, ConversionRequest, Layout, Workspace};
use crate::directions::client::AwcTransport;
use crate::kml::document::Geometry;
use crate::server::cors::cors_middleware;

use actix_multipart::Multipart;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use futures::StreamExt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const WARNINGS_HEADER: &str = "X-Conversion-Warnings";

/// Settings shared by every request.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base directory for per-request workspaces
    pub work_dir: PathBuf,
    pub directions_url: String,
    /// Largest accepted size of a single uploaded file
    pub max_upload_bytes: usize,
    /// Origin allowed by CORS; any origin when unset
    pub allowed_origin: Option<String>,
}

pub struct AppState {
    config: ServerConfig,
}

#[derive(Default)]
struct UploadForm {
    stops: Option<PathBuf>,
    routes: Option<PathBuf>,
    stops_name: Option<String>,
    routes_name: Option<String>,
    api_key: Option<String>,
    layout: Option<String>,
    geometry: Option<String>,
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/convert")]
async fn convert_upload(mut payload: Multipart, data: web::Data<AppState>) -> impl Responder {
    let config = &data.config;
    let workspace = match Workspace::create(&config.work_dir, Uuid::new_v4()) {
        Ok(workspace) => workspace,
        Err(e) => {
            log::error!("Failed to create workspace: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Cannot create request workspace"
            }));
        }
    };

    let response = handle_conversion(&mut payload, config, &workspace).await;
    if let Err(e) = workspace.cleanup() {
        log::warn!("Failed to remove workspace {}: {}", workspace.root().display(), e);
    }
    response
}

async fn handle_conversion(
    payload: &mut Multipart,
    config: &ServerConfig,
    workspace: &Workspace,
) -> HttpResponse {
    let form = match read_form(payload, &workspace.uploads_dir(), config.max_upload_bytes).await {
        Ok(form) => form,
        Err(message) => return bad_request(&message),
    };
    let request = match build_request(form, config) {
        Ok(request) => request,
        Err(message) => return bad_request(&message),
    };
    log::info!(
        "Converting {} and {} as request {}",
        request.stops_file.display(),
        request.routes_file.display(),
        request.id
    );

    let output = match convert::convert(&request, AwcTransport::new(), workspace).await {
        Ok(output) => output,
        Err(e) => {
            log::warn!("Conversion {} failed: {}", request.id, e);
            let body = serde_json::json!({ "error": e.to_string() });
            return if e.is_missing_column() {
                HttpResponse::UnprocessableEntity().json(body)
            } else if e.is_input_error() {
                HttpResponse::BadRequest().json(body)
            } else {
                HttpResponse::InternalServerError().json(body)
            };
        }
    };
    for warning in &output.warnings {
        log::warn!("Conversion {}: {}", request.id, warning);
    }

    let bytes = match std::fs::read(&output.artifact) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Failed to read {}: {}", output.artifact.display(), e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Cannot read conversion output"
            }));
        }
    };
    let file_name = output
        .artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let content_type = if file_name.ends_with(".zip") {
        "application/zip"
    } else {
        "application/vnd.google-earth.kml+xml"
    };

    HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
        ))
        .insert_header((WARNINGS_HEADER, output.warnings.len().to_string()))
        .body(bytes)
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

/// Reads the multipart form, saving uploaded files into `uploads_dir`.
async fn read_form(
    payload: &mut Multipart,
    uploads_dir: &Path,
    max_upload_bytes: usize,
) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("Invalid upload: {}", e))?;
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| format!("Invalid upload: {}", e))?;
            if bytes.len() + chunk.len() > max_upload_bytes {
                return Err(format!(
                    "Field '{}' exceeds the {} byte upload limit",
                    name, max_upload_bytes
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "stops" | "routes" => {
                let extension = file_name
                    .as_deref()
                    .and_then(|f| Path::new(f).extension())
                    .map(|e| e.to_string_lossy().to_lowercase())
                    .unwrap_or_else(|| "xlsx".to_string());
                // Stored under a fixed name so client file names never reach the filesystem
                let path = uploads_dir.join(format!("{}.{}", name, extension));
                std::fs::write(&path, &bytes)
                    .map_err(|e| format!("Cannot store upload '{}': {}", name, e))?;
                if name == "stops" {
                    form.stops = Some(path);
                    form.stops_name = file_name;
                } else {
                    form.routes = Some(path);
                    form.routes_name = file_name;
                }
            }
            "api_key" => form.api_key = Some(text_field(&bytes)),
            "layout" => form.layout = Some(text_field(&bytes)),
            "geometry" => form.geometry = Some(text_field(&bytes)),
            other => log::debug!("Ignoring form field '{}'", other),
        }
    }
    Ok(form)
}

fn text_field(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn build_request(form: UploadForm, config: &ServerConfig) -> Result<ConversionRequest, String> {
    let stops = form.stops.ok_or("Please upload the bus stops file")?;
    let routes = form.routes.ok_or("Please upload the bus routes file")?;
    let api_key = form
        .api_key
        .filter(|k| !k.is_empty())
        .ok_or("Please enter the API key")?;

    let mut options = ConversionOptions {
        directions_url: config.directions_url.clone(),
        ..ConversionOptions::default()
    };
    if let Some(layout) = form.layout.filter(|l| !l.is_empty()) {
        options.layout = layout.parse::<Layout>()?;
    }
    if let Some(geometry) = form.geometry.filter(|g| !g.is_empty()) {
        options.geometry = geometry.parse::<Geometry>()?;
    }
    Ok(ConversionRequest::new(stops, routes, &api_key)
        .with_options(options)
        .with_upload_names(form.stops_name, form.routes_name))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(convert_upload);
}

pub async fn start_server(host: &str, port: u16, config: ServerConfig) -> std::io::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    std::fs::create_dir_all(&config.work_dir)?;
    log::info!(
        "Request workspaces under {}, directions from {}",
        config.work_dir.display(),
        config.directions_url
    );

    let allowed_origin = config.allowed_origin.clone();
    let app_state = web::Data::new(AppState { config });

    log::info!("Starting server on {}", addr);
    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(allowed_origin.as_deref()))
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await
}
