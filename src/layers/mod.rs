pub mod error;
pub mod geo_util;
pub mod route_join;
pub mod route_path;
pub mod stop_registry;
