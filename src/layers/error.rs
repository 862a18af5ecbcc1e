use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Sheets(#[from] crate::sheets::error::Error),
    #[error("Invalid {column} value '{value}' for stop '{stop}' in sheet '{table}'")]
    InvalidCoordinate {
        table: String,
        stop: String,
        column: String,
        value: String,
    },
}
