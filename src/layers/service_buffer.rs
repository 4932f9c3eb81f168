use std::f64::consts::{FRAC_PI_2, PI, TAU};

use geo::{BooleanOps, Intersects, MapCoords};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};

use super::geo_util::PlanarProjection;
use super::route_geometry::RouteGeometry;

/// Fixed buffer radius: three quarters of a mile in meters.
pub const BUFFER_RADIUS_METERS: f64 = 1207.01;

/// Vertices per full circle when approximating round caps.
const CIRCLE_SEGMENTS: usize = 32;

// Layer 2 - Area within walking distance of any route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBuffer {
    /// Union of all per-route buffers, WGS84. May have several parts.
    pub area: MultiPolygon,
    pub radius_meters: f64,
}

impl ServiceBuffer {
    /// Buffers every route at `radius_meters` and unions the results.
    ///
    /// Each line is projected into the planar frame so the radius is a
    /// true distance in meters, buffered there, then unprojected. Lines
    /// whose buffers overlap merge into one part; disjoint pieces stay
    /// separate parts of the multipolygon.
    ///
    /// # Parameters
    /// - `routes`: The route geometries (WGS84)
    /// - `projection`: Planar frame the buffering runs in
    /// - `radius_meters`: Buffer radius in meters
    ///
    /// # Returns
    /// The unioned service buffer in WGS84
    pub fn around(
        routes: &[RouteGeometry],
        projection: &PlanarProjection,
        radius_meters: f64,
    ) -> ServiceBuffer {
        let per_route: Vec<MultiPolygon> = routes
            .iter()
            .map(|route| {
                let planar = route.line.map_coords(|c| projection.project(c));
                buffer_line(&planar, radius_meters)
            })
            .collect();
        let unioned = per_route
            .iter()
            .fold(MultiPolygon::new(Vec::new()), |acc, part| acc.union(part));
        ServiceBuffer {
            area: unioned.map_coords(|c| projection.unproject(c)),
            radius_meters,
        }
    }

    /// Whether a point lies inside the buffer or exactly on its boundary.
    ///
    /// Uses `Intersects` rather than `Contains`: the boundary counts as
    /// in, so an address sitting exactly at the buffer edge is covered.
    pub fn contains(&self, point: Point) -> bool {
        self.area.intersects(&point)
    }
}

/// Buffers one planar line. Every segment contributes a capsule, a
/// zero-length segment a full circle, all unioned together.
fn buffer_line(line: &LineString, radius: f64) -> MultiPolygon {
    line.lines()
        .map(|seg| capsule(seg.start, seg.end, radius))
        .fold(MultiPolygon::new(Vec::new()), |acc, capsule| {
            acc.union(&capsule)
        })
}

/// Rectangle along the segment plus a semicircular cap at each end.
fn capsule(a: Coord, b: Coord, radius: f64) -> Polygon {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    if dx.hypot(dy) < 1e-9 {
        return circle(a, radius);
    }
    let theta = dy.atan2(dx);
    let half = CIRCLE_SEGMENTS / 2;
    let mut ring = Vec::with_capacity(CIRCLE_SEGMENTS + 2);
    // Cap beyond b, swept counterclockwise across the heading
    for i in 0..=half {
        let ang = theta - FRAC_PI_2 + PI * i as f64 / half as f64;
        ring.push(Coord {
            x: b.x + radius * ang.cos(),
            y: b.y + radius * ang.sin(),
        });
    }
    // Cap behind a
    for i in 0..=half {
        let ang = theta + FRAC_PI_2 + PI * i as f64 / half as f64;
        ring.push(Coord {
            x: a.x + radius * ang.cos(),
            y: a.y + radius * ang.sin(),
        });
    }
    Polygon::new(LineString::from(ring), vec![])
}

fn circle(center: Coord, radius: f64) -> Polygon {
    let ring: Vec<Coord> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let ang = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            Coord {
                x: center.x + radius * ang.cos(),
                y: center.y + radius * ang.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}
