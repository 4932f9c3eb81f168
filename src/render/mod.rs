pub mod geojson;
pub mod html;
