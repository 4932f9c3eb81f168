pub mod coverage;
pub mod error;
pub mod geo_util;
pub mod route_geometry;
pub mod service_buffer;
