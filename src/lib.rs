pub mod convert;
pub mod directions;
pub mod kml;
pub mod layers;
pub mod report;
pub mod server;
pub mod sheets;
