pub mod cors;
pub mod server;

pub use server::{configure, start_server, ServerConfig};
