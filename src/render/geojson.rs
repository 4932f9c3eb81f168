use serde_json::{json, Value};

use geo_types::LineString;

use crate::layers::coverage::Coverage;
use crate::layers::route_geometry::RouteGeometry;
use crate::layers::service_buffer::ServiceBuffer;

// Style travels with each feature so the renderer never captures it
// from surrounding code.
pub const ROUTE_COLOR: &str = "blue";
pub const ROUTE_WEIGHT: u32 = 2;
pub const BUFFER_COLOR: &str = "green";
pub const BUFFER_FILL_OPACITY: f64 = 0.25;

pub fn convert_to_geojson(features: &Vec<Value>) -> Value {
    let output = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    return output;
}

pub fn get_all_features(coverage: &Coverage) -> Vec<Value> {
    let mut feature_set: Vec<Value> = vec![];
    feature_set.extend(get_route_features(&coverage.routes));
    feature_set.push(get_buffer_feature(&coverage.buffer));

    return feature_set;
}

// Build one styled line feature per route
pub fn get_route_features(routes: &[RouteGeometry]) -> Vec<Value> {
    let features = routes
        .iter()
        .map(|route| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": get_line_coords(route),
                },
                "properties": {
                    "shape_id": &route.shape_id,
                    "color": ROUTE_COLOR,
                    "weight": ROUTE_WEIGHT,
                }
            })
        })
        .collect::<Vec<Value>>();

    return features;
}

// Build the buffer feature, fill style carried in its properties
pub fn get_buffer_feature(buffer: &ServiceBuffer) -> Value {
    let coordinates = buffer
        .area
        .0
        .iter()
        .map(|polygon| {
            let mut rings = vec![ring_coords(polygon.exterior())];
            rings.extend(polygon.interiors().iter().map(ring_coords));
            rings
        })
        .collect::<Vec<_>>();

    json!({
        "type": "Feature",
        "geometry": {
            "type": "MultiPolygon",
            "coordinates": coordinates,
        },
        "properties": {
            "color": BUFFER_COLOR,
            "fill_opacity": BUFFER_FILL_OPACITY,
            "radius_meters": buffer.radius_meters,
        }
    })
}

pub fn get_line_coords(route: &RouteGeometry) -> Vec<[f64; 2]> {
    route.line.coords().map(|c| [c.x, c.y]).collect()
}

fn ring_coords(ring: &LineString) -> Vec<[f64; 2]> {
    ring.coords().map(|c| [c.x, c.y]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Coord;

    fn straight_route() -> RouteGeometry {
        RouteGeometry {
            shape_id: "A".to_string(),
            line: vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.02, y: 0.0 }]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn route_feature_carries_its_own_style() {
        let features = get_route_features(&[straight_route()]);
        assert_eq!(features.len(), 1);
        let props = &features[0]["properties"];
        assert_eq!(props["color"], "blue");
        assert_eq!(props["weight"], 2);
        assert_eq!(props["shape_id"], "A");
        // Coordinates are (lon, lat) pairs.
        assert_eq!(features[0]["geometry"]["coordinates"][1][0], 0.02);
    }

    #[test]
    fn buffer_feature_is_a_multipolygon_with_fill() {
        use crate::layers::geo_util::PlanarProjection;
        use crate::layers::service_buffer::{ServiceBuffer, BUFFER_RADIUS_METERS};

        let buffer = ServiceBuffer::around(
            &[straight_route()],
            &PlanarProjection::centered_on(Coord { x: 0.01, y: 0.0 }),
            BUFFER_RADIUS_METERS,
        );
        let feature = get_buffer_feature(&buffer);
        assert_eq!(feature["geometry"]["type"], "MultiPolygon");
        assert_eq!(feature["properties"]["color"], "green");
        assert_eq!(feature["properties"]["fill_opacity"], 0.25);
        let rings = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert!(!rings.is_empty());
    }

    #[test]
    fn collection_wraps_all_features() {
        let features = get_route_features(&[straight_route()]);
        let collection = convert_to_geojson(&features);
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["features"].as_array().unwrap().len(), 1);
    }
}
