use geo_types::{Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::gtfs::feed::{Feed, ShapePoint};

// Layer 1 - Line geometry of each transit route, straight from the shape table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteGeometry {
    pub shape_id: String,
    /// Vertices in (longitude, latitude) order, WGS84
    pub line: LineString,
}

/// Builds one line per shape from the feed's shape points.
///
/// Points are ordered by (shape_id, shape_pt_sequence) with a stable sort,
/// so rows sharing a sequence value keep their original file order. Shapes
/// with fewer than two points cannot form a line and are skipped.
///
/// # Parameters
/// - `feed`: The GTFS feed
///
/// # Returns
/// The route geometries in shape_id order and the number of skipped shapes
pub fn build_routes(feed: &Feed) -> (Vec<RouteGeometry>, usize) {
    let mut points: Vec<&ShapePoint> = feed.shape_points.iter().collect();
    points.sort_by(|a, b| {
        a.shape_id
            .cmp(&b.shape_id)
            .then(a.shape_pt_sequence.cmp(&b.shape_pt_sequence))
    });

    let mut routes = Vec::new();
    let mut skipped = 0;
    let mut i = 0;
    while i < points.len() {
        let shape_id = points[i].shape_id.as_str();
        let mut j = i;
        while j < points.len() && points[j].shape_id == shape_id {
            j += 1;
        }
        if j - i >= 2 {
            let line = points[i..j]
                .iter()
                .map(|sp| Coord {
                    x: sp.shape_pt_lon,
                    y: sp.shape_pt_lat,
                })
                .collect::<LineString>();
            routes.push(RouteGeometry {
                shape_id: shape_id.to_string(),
                line,
            });
        } else {
            log::debug!("Skipping shape {} with {} point(s)", shape_id, j - i);
            skipped += 1;
        }
        i = j;
    }
    (routes, skipped)
}
