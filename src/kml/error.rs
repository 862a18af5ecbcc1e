use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot serialize KML: {0}")]
    Xml(String),
    #[error("Cannot write file")]
    IO(#[from] std::io::Error),
}
