use serde_json::{json, Value};

use crate::layers::coverage::Coverage;

use super::geojson;

pub const MAP_ZOOM: u32 = 12;
pub const DOWNLOAD_FILE_NAME: &str = "transit_buffer_map.html";

const MAP_TEMPLATE: &str = include_str!("map_template.html");

/// Marker for one checked address: green when the point is inside the
/// buffer, red when it is not.
#[derive(Debug, Clone)]
pub struct AddressMarker {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub within: bool,
}

impl AddressMarker {
    fn color(&self) -> &'static str {
        if self.within {
            "green"
        } else {
            "red"
        }
    }
}

/// Renders the standalone map document
///
/// # Parameters
/// - `coverage`: The feed geometry to draw
/// - `markers`: The checked addresses, at most one per role
///
/// # Returns
/// A self-contained HTML page (tile and Leaflet CDN assets aside)
pub fn render_map(coverage: &Coverage, markers: &[AddressMarker]) -> String {
    let features = geojson::get_all_features(coverage);
    let collection = geojson::convert_to_geojson(&features);
    let marker_values: Vec<Value> = markers
        .iter()
        .map(|m| {
            json!({
                "lat": m.lat,
                "lon": m.lon,
                "label": m.label,
                "color": m.color(),
            })
        })
        .collect();

    MAP_TEMPLATE
        .replace("__CENTER_LAT__", &coverage.center.y.to_string())
        .replace("__CENTER_LON__", &coverage.center.x.to_string())
        .replace("__ZOOM__", &MAP_ZOOM.to_string())
        .replace("__GEOJSON__", &json_for_html(&collection))
        .replace("__MARKERS__", &json_for_html(&Value::Array(marker_values)))
}

/// JSON embedded in a script element must not contain a literal `</`,
/// or address text could close the element early.
fn json_for_html(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs::feed::{Feed, ShapePoint};

    fn coverage() -> Coverage {
        let feed = Feed {
            shape_points: vec![
                ShapePoint {
                    shape_id: "A".to_string(),
                    shape_pt_lat: 0.0,
                    shape_pt_lon: 0.0,
                    shape_pt_sequence: 1,
                    shape_dist_traveled: None,
                },
                ShapePoint {
                    shape_id: "A".to_string(),
                    shape_pt_lat: 0.0,
                    shape_pt_lon: 0.02,
                    shape_pt_sequence: 2,
                    shape_dist_traveled: None,
                },
            ],
        };
        Coverage::from_feed(&feed).unwrap()
    }

    #[test]
    fn document_is_complete_and_centered() {
        let page = render_map(&coverage(), &[]);
        assert!(page.contains("<!DOCTYPE html>"));
        assert!(page.contains("leaflet"));
        assert!(page.contains("FeatureCollection"));
        assert!(page.contains(", 12)"));
        assert!(!page.contains("__CENTER_LAT__"));
        assert!(!page.contains("__CENTER_LON__"));
        assert!(!page.contains("__ZOOM__"));
        assert!(!page.contains("__GEOJSON__"));
        assert!(!page.contains("__MARKERS__"));
    }

    #[test]
    fn markers_are_colored_by_containment() {
        let markers = vec![
            AddressMarker {
                label: "inside".to_string(),
                lat: 0.0,
                lon: 0.01,
                within: true,
            },
            AddressMarker {
                label: "outside".to_string(),
                lat: 0.5,
                lon: 0.01,
                within: false,
            },
        ];
        let page = render_map(&coverage(), &markers);
        assert!(page.contains(r#""color":"green","label":"inside""#));
        assert!(page.contains(r#""color":"red","label":"outside""#));
    }

    #[test]
    fn address_text_cannot_close_the_script_element() {
        let markers = vec![AddressMarker {
            label: "10 Main St </script><script>alert(1)".to_string(),
            lat: 0.0,
            lon: 0.01,
            within: true,
        }];
        let page = render_map(&coverage(), &markers);
        assert!(!page.contains("</script><script>alert"));
    }
}
