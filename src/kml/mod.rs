pub mod document;
pub mod error;
pub mod writer;

pub use document::{Geometry, KmlDocument, LineStyle, Placemark};
pub use error::Error;
