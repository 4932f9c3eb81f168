pub mod geocode;
pub mod gtfs;
pub mod layers;
pub mod render;
pub mod server;
