pub mod client;
pub mod error;
pub mod polyline;
pub mod response;

pub use client::{AwcTransport, DirectionsClient, Transport, DEFAULT_DIRECTIONS_URL};
pub use error::Error;
