use clap::Parser;
use std::path::PathBuf;

use bus_route_kml::directions::client::install_crypto_provider;
use bus_route_kml::directions::DEFAULT_DIRECTIONS_URL;
use bus_route_kml::server::{start_server, ServerConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serves bus route KML conversions over HTTP", long_about = None)]
struct Args {
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Base directory for per-request workspaces
    #[arg(long, env = "WORK_DIR", default_value = "work")]
    work_dir: PathBuf,

    #[arg(long, env = "DIRECTIONS_URL", default_value = DEFAULT_DIRECTIONS_URL)]
    directions_url: String,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Origin allowed by CORS; any origin when unset
    #[arg(long, env = "ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    install_crypto_provider();

    let config = ServerConfig {
        work_dir: args.work_dir,
        directions_url: args.directions_url,
        max_upload_bytes: args.max_upload_bytes,
        allowed_origin: args.allowed_origin,
    };
    start_server(&args.host, args.port, config).await
}
