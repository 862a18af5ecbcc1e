use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::directions::client::DEFAULT_DIRECTIONS_URL;
use crate::kml::document::{Geometry, LineStyle};

/// How route paths are split across output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// One KML file per route sheet
    #[default]
    PerRoute,
    /// A single KML file with one folder per route
    Combined,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-route" | "per_route" => Ok(Layout::PerRoute),
            "combined" | "single" => Ok(Layout::Combined),
            other => Err(format!(
                "unknown layout '{}', expected 'per-route' or 'combined'",
                other
            )),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::PerRoute => write!(f, "per-route"),
            Layout::Combined => write!(f, "combined"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOptions {
    pub layout: Layout,
    pub geometry: Geometry,
    pub style: LineStyle,
    /// Directions service endpoint
    pub directions_url: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            layout: Layout::default(),
            geometry: Geometry::default(),
            style: LineStyle::default(),
            directions_url: DEFAULT_DIRECTIONS_URL.to_string(),
        }
    }
}

/// Everything one conversion needs, passed explicitly through the pipeline.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub id: Uuid,
    pub stops_file: PathBuf,
    pub routes_file: PathBuf,
    /// File names the inputs were uploaded under, when stored elsewhere
    pub stops_upload_name: Option<String>,
    pub routes_upload_name: Option<String>,
    pub api_key: String,
    pub options: ConversionOptions,
}

impl ConversionRequest {
    pub fn new<P, Q>(stops_file: P, routes_file: Q, api_key: &str) -> ConversionRequest
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        ConversionRequest {
            id: Uuid::new_v4(),
            stops_file: stops_file.as_ref().to_path_buf(),
            routes_file: routes_file.as_ref().to_path_buf(),
            stops_upload_name: None,
            routes_upload_name: None,
            api_key: api_key.to_string(),
            options: ConversionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> ConversionRequest {
        self.options = options;
        self
    }

    pub fn with_upload_names(
        mut self,
        stops: Option<String>,
        routes: Option<String>,
    ) -> ConversionRequest {
        self.stops_upload_name = stops;
        self.routes_upload_name = routes;
        self
    }
}

/// Scratch directory owned by a single request, named after its id.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates `<base>/<request id>` with `uploads`, `merged` and `output`
    /// sub-directories.
    pub fn create<P>(base: P, id: Uuid) -> std::io::Result<Workspace>
    where
        P: AsRef<Path>,
    {
        let workspace = Workspace {
            root: base.as_ref().join(id.to_string()),
        };
        for dir in [
            workspace.uploads_dir(),
            workspace.merged_dir(),
            workspace.output_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        log::debug!("Created workspace {}", workspace.root.display());
        Ok(workspace)
    }

    /// Uses an existing directory as-is; nothing is cleaned up on its behalf.
    pub fn at<P>(dir: P) -> std::io::Result<Workspace>
    where
        P: AsRef<Path>,
    {
        let workspace = Workspace {
            root: dir.as_ref().to_path_buf(),
        };
        std::fs::create_dir_all(workspace.merged_dir())?;
        std::fs::create_dir_all(workspace.output_dir())?;
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn merged_dir(&self) -> PathBuf {
        self.root.join("merged")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    pub fn cleanup(&self) -> std::io::Result<()> {
        log::debug!("Removing workspace {}", self.root.display());
        std::fs::remove_dir_all(&self.root)
    }
}
