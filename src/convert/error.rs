use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Error(String),
    #[error("The routes workbook does not contain any route sheet")]
    NoRoutes,
    #[error("Cannot write file")]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Sheets(#[from] crate::sheets::error::Error),
    #[error(transparent)]
    Layers(#[from] crate::layers::error::Error),
    #[error(transparent)]
    Kml(#[from] crate::kml::error::Error),
    #[error(transparent)]
    Directions(#[from] crate::directions::error::Error),
}

impl Error {
    /// True when an input sheet lacks a required column.
    pub fn is_missing_column(&self) -> bool {
        use crate::layers::error::Error as LayerError;
        use crate::sheets::error::Error as SheetError;
        matches!(
            self,
            Error::Sheets(SheetError::MissingColumn { .. })
                | Error::Layers(LayerError::Sheets(SheetError::MissingColumn { .. }))
        )
    }

    /// True when the request inputs, rather than the service, are at fault.
    pub fn is_input_error(&self) -> bool {
        use crate::layers::error::Error as LayerError;
        use crate::sheets::error::Error as SheetError;
        match self {
            Error::NoRoutes | Error::Directions(_) => true,
            Error::Layers(LayerError::InvalidCoordinate { .. }) => true,
            Error::Sheets(e) | Error::Layers(LayerError::Sheets(e)) => !matches!(
                e,
                SheetError::IO(_) | SheetError::NamedFileIO { .. }
            ),
            _ => false,
        }
    }
}
