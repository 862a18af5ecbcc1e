use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use bus_route_kml::convert::{
    self, ConversionOptions, ConversionOutput, ConversionRequest, Layout, Workspace,
};
use bus_route_kml::directions::client::install_crypto_provider;
use bus_route_kml::directions::{AwcTransport, DEFAULT_DIRECTIONS_URL};
use bus_route_kml::kml::Geometry;
use bus_route_kml::report::Warning;
use bus_route_kml::sheets::Workbook;

#[derive(Parser, Debug)]
#[command(author, version, about = "Converts bus stop and route sheets to KML", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join route sheets against the stop registry and write merged sheets
    Merge {
        #[arg(long)]
        stops: PathBuf,

        #[arg(long)]
        routes: PathBuf,

        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Build KML files from previously merged sheets
    Kml {
        /// Merged workbook, or a directory of merged CSV sheets
        #[arg(long)]
        merged: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Merge and build KML files in one go
    Convert {
        #[arg(long)]
        stops: PathBuf,

        #[arg(long)]
        routes: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    #[arg(long, env = "DIRECTIONS_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long)]
    output_dir: PathBuf,

    #[arg(long, default_value_t = Layout::PerRoute)]
    layout: Layout,

    #[arg(long, default_value_t = Geometry::Segment)]
    geometry: Geometry,

    #[arg(long, env = "DIRECTIONS_URL", default_value = DEFAULT_DIRECTIONS_URL)]
    directions_url: String,
}

impl OutputArgs {
    fn options(&self) -> ConversionOptions {
        ConversionOptions {
            layout: self.layout,
            geometry: self.geometry,
            directions_url: self.directions_url.clone(),
            ..ConversionOptions::default()
        }
    }
}

fn print_warnings(warnings: &[Warning]) {
    for warning in warnings {
        println!("  warning: {}", warning);
    }
}

fn report(output: &ConversionOutput) {
    output.print_stats();
    print_warnings(&output.warnings);
}

#[actix_rt::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    install_crypto_provider();

    match args.command {
        Command::Merge {
            stops,
            routes,
            output_dir,
        } => {
            println!("Reading stops from path: {}", stops.display());
            let stops = Workbook::from_path(&stops)?;
            stops.print_stats();

            println!("Reading routes from path: {}", routes.display());
            let routes = Workbook::from_path(&routes)?;
            routes.print_stats();

            let merged = convert::merge(&stops, &routes)?;
            merged.registry.print_stats();
            for route in &merged.routes {
                route.print_stats();
            }
            let files = merged.workbook().write_csv_dir(&output_dir)?;
            println!("Wrote {} merged sheets to {}", files.len(), output_dir.display());
            print_warnings(&merged.warnings);
        }
        Command::Kml { merged, output } => {
            println!("Reading merged sheets from path: {}", merged.display());
            let merged = Workbook::from_path(&merged)?;
            merged.print_stats();

            let workspace = Workspace::at(&output.output_dir)?;
            let result = convert::convert_merged(
                &merged,
                &output.api_key,
                &output.options(),
                AwcTransport::new(),
                &workspace,
            )
            .await?;
            report(&result);
        }
        Command::Convert {
            stops,
            routes,
            output,
        } => {
            let request =
                ConversionRequest::new(stops, routes, &output.api_key).with_options(output.options());
            println!("Running conversion {}", request.id);
            let workspace = Workspace::at(&output.output_dir)?;
            let result = convert::convert(&request, AwcTransport::new(), &workspace).await?;
            report(&result);
        }
    }
    Ok(())
}
