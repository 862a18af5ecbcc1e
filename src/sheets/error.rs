use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// An error that can occur when reading spreadsheet data.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more mandatory columns are absent from a sheet
    #[error("Columns {} not found in sheet '{table}'", quote_all(.columns))]
    MissingColumn {
        /// Name of the sheet that was inspected
        table: String,
        /// Every required column that could not be found
        columns: Vec<String>,
    },
    /// The given path is neither a file nor a directory
    #[error("Could not read spreadsheet: {0} is neither a file nor a directory")]
    NotFileNorDirectory(String),
    /// The file extension is not a known spreadsheet format
    #[error("Unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),
    /// The workbook does not contain any sheet
    #[error("Workbook '{0}' does not contain any sheet")]
    EmptyWorkbook(String),
    /// Generic Input/Output error while reading a file
    #[error("impossible to read file")]
    IO(#[from] std::io::Error),
    /// Impossible to read a file
    #[error("impossible to read '{file_name}'")]
    NamedFileIO {
        /// The file name that could not be read
        file_name: String,
        /// The inital error that caused the unability to read the file
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Impossible to read a CSV file
    #[error("impossible to read csv file '{file_name}'")]
    CSVError {
        /// File name that could not be parsed as CSV
        file_name: String,
        /// The initial error by the csv library
        #[source]
        source: csv::Error,
    },
    /// Error when trying to unzip an archive of sheets
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Error raised by the workbook reader
    #[error(transparent)]
    Workbook(#[from] calamine::Error),
}

fn quote_all(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<String>>()
        .join(" and/or ")
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Error {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Err(serde::de::Error::custom(format!(
            "cannot deserialize Error: {}",
            s
        )))
    }
}
